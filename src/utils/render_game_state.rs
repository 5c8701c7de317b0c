//! Terminal-oriented grid renderer.
//!
//! Creates a human-readable board view for the console, tests, and
//! diagnostics in text environments. Blue units print as `B<id>`, Red units
//! as `R<id>`, empty tiles as `.`; row 0 is printed first.

use std::fmt::Write;

use crate::game_state::game_state::GameState;
use crate::game_state::tactics_types::Side;

pub fn render_game_state(game_state: &GameState) -> String {
    let mut out = String::new();

    for y in 0..i32::from(game_state.height) {
        let cells: Vec<String> = (0..i32::from(game_state.width))
            .map(|x| {
                game_state
                    .tile_at(x, y)
                    .and_then(|t| game_state.unit_at(t))
                    .map_or_else(
                        || " .".to_owned(),
                        |u| {
                            let team = match u.team {
                                Side::Blue => 'B',
                                Side::Red => 'R',
                            };
                            format!("{team}{}", u.id)
                        },
                    )
            })
            .collect();
        let _ = writeln!(out, "{}", cells.join(" "));
    }

    let _ = write!(
        out,
        "to act: {:?}  team AP: {}/{}  key: {:#018x}",
        game_state.side_to_act, game_state.team_ap[0], game_state.team_ap[1], game_state.key
    );
    out
}

/// One line per roster slot: id, team, tile, HP, AP and alive flag.
pub fn render_roster(game_state: &GameState) -> String {
    game_state
        .units
        .iter()
        .map(|u| {
            let tile = u.tile.map_or_else(|| "-".to_owned(), |t| t.to_string());
            format!(
                "unit {} {:?} tile {} hp {} ap {}{}",
                u.id,
                u.team,
                tile,
                u.hp,
                u.ap,
                if u.alive { "" } else { " (dead)" }
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::{render_game_state, render_roster};
    use crate::utils::sample_positions::two_unit_skirmish;

    #[test]
    fn renders_units_on_grid() {
        let state = two_unit_skirmish();
        let text = render_game_state(&state);
        let rows: Vec<&str> = text.lines().collect();
        assert_eq!(rows.len(), 6);
        assert_eq!(rows[2], " .  . B0 R1  .");
        assert!(rows[5].starts_with("to act: Blue"));
    }

    #[test]
    fn roster_marks_dead_units() {
        let mut state = two_unit_skirmish();
        state.units[1].alive = false;
        let text = render_roster(&state);
        assert!(text.lines().nth(1).is_some_and(|l| l.ends_with("(dead)")));
    }
}
