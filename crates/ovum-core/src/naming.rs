//! Name normalisation helpers.
//!
//! Canonical names are lowercase, underscore separated and dotted:
//! `PlayerController` declared in module `units` becomes `units.player_controller`.
//! Titles are the human-facing form: `Player Controller`.

/// Convert an identifier to canonical "programmer case".
///
/// An underscore is inserted before every uppercase letter, spaces become
/// underscores, a leading underscore is trimmed and the result is lowercased.
/// When `prefix` is given, the last `.` or `::` segment of it is prepended
/// with a dot.
///
/// ```
/// use ovum_core::naming::to_programmer_case;
///
/// assert_eq!(to_programmer_case("MaxHealth", None), "max_health");
/// assert_eq!(to_programmer_case("MaxHealth", Some("game::units::Player")), "player.max_health");
/// ```
pub fn to_programmer_case(value: &str, prefix: Option<&str>) -> String {
    let mut name = String::with_capacity(value.len() + 4);
    for ch in value.chars() {
        if ch.is_uppercase() {
            name.push('_');
            name.extend(ch.to_lowercase());
        } else if ch == ' ' {
            name.push('_');
        } else {
            name.push(ch);
        }
    }

    let name = name.trim_start_matches('_');
    match prefix.map(last_segment).filter(|p| !p.is_empty()) {
        Some(prefix) => format!("{}.{}", to_programmer_case(prefix, None), name),
        None => name.to_string(),
    }
}

/// Convert an identifier to a human-facing title.
///
/// Words are split on `_`, `-`, `.`, spaces and lower-to-upper case
/// boundaries, capitalised and joined with single spaces.
///
/// ```
/// use ovum_core::naming::to_title_case;
///
/// assert_eq!(to_title_case("PlayerController"), "Player Controller");
/// assert_eq!(to_title_case("max_health"), "Max Health");
/// ```
pub fn to_title_case(value: &str) -> String {
    let mut words: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut previous_lower = false;

    for ch in value.chars() {
        if matches!(ch, '_' | '-' | '.' | ' ') {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
            previous_lower = false;
            continue;
        }
        if ch.is_uppercase() && previous_lower && !current.is_empty() {
            words.push(std::mem::take(&mut current));
        }
        previous_lower = ch.is_lowercase() || ch.is_ascii_digit();
        current.push(ch);
    }
    if !current.is_empty() {
        words.push(current);
    }

    words
        .iter()
        .map(|word| capitalize(word))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Canonical name of a member declared on a library with the given prefix.
pub fn member_name(prefix: &str, member: &str) -> String {
    to_programmer_case(member, Some(prefix))
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn last_segment(path: &str) -> &str {
    path.rsplit(['.', ':']).next().unwrap_or(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn programmer_case_basic() {
        assert_eq!(to_programmer_case("count", None), "count");
        assert_eq!(to_programmer_case("Count", None), "count");
        assert_eq!(to_programmer_case("PlayerController", None), "player_controller");
        assert_eq!(to_programmer_case("move speed", None), "move_speed");
    }

    #[test]
    fn programmer_case_with_prefix() {
        assert_eq!(to_programmer_case("count", Some("a")), "a.count");
        assert_eq!(to_programmer_case("Count", Some("game.units.Player")), "player.count");
        assert_eq!(to_programmer_case("Count", Some("game::units")), "units.count");
        assert_eq!(to_programmer_case("Count", Some("")), "count");
    }

    #[test]
    fn programmer_case_keeps_existing_underscores() {
        assert_eq!(to_programmer_case("max_health", None), "max_health");
        assert_eq!(to_programmer_case("_hidden", None), "hidden");
    }

    #[test]
    fn title_case_splits_words() {
        assert_eq!(to_title_case("PlayerController"), "Player Controller");
        assert_eq!(to_title_case("player_controller"), "Player Controller");
        assert_eq!(to_title_case("units.player-controller"), "Units Player Controller");
        assert_eq!(to_title_case("hp2Max"), "Hp2 Max");
        assert_eq!(to_title_case(""), "");
    }

    #[test]
    fn member_name_uses_prefix() {
        assert_eq!(member_name("a", "Count"), "a.count");
    }
}
