//! Heuristics for permission bits written in decimal by mistake.
//!
//! `"mode": 644` is almost always meant as `0o644`. A mode is flagged when it
//! looks unusual as given but its decimal digits read as octal look normal.

/// Highest value the permission bits can hold.
pub const MAX_MODE: i64 = 0o7777;

/// True when `mode` was probably written in decimal instead of octal.
pub fn is_decimal_mode(mode: i64, directory: bool) -> bool {
    match decimal_mode_to_octal(mode) {
        Some(corrected) => !is_typical_mode(mode, directory) && is_typical_mode(corrected, directory),
        None => false,
    }
}

/// Read the decimal digits of `mode` as octal digits.
fn decimal_mode_to_octal(mode: i64) -> Option<i64> {
    if !(0..=7777).contains(&mode) {
        return None;
    }
    let mut octal = 0;
    let mut divisor = 1000;
    while divisor > 0 {
        let digit = (mode / divisor) % 10;
        if digit > 7 {
            return None;
        }
        octal = (octal << 3) | digit;
        divisor /= 10;
    }
    Some(octal)
}

/// True for permission sets nobody would be surprised by.
fn is_typical_mode(mode: i64, directory: bool) -> bool {
    // root ignores mode bits
    if mode == 0 {
        return true;
    }

    let (mut had_r, mut had_w, mut had_x) = (false, false, false);
    // other, group, user
    for perm in [mode & 0o7, (mode & 0o70) >> 3, (mode & 0o700) >> 6] {
        let r = perm & 4 != 0;
        let w = perm & 2 != 0;
        let x = perm & 1 != 0;
        // a more specific class has every bit of a less specific one
        if (!r && had_r) || (!w && had_w) || (!x && had_x) {
            return false;
        }
        if x && had_r && !had_x {
            return false;
        }
        // -w- and --x
        if (w || x) && !r {
            return false;
        }
        had_r |= r;
        had_w |= w;
        had_x |= x;
    }

    if !had_r {
        return false;
    }

    if directory {
        if !had_x || mode & 0o4000 != 0 {
            return false;
        }
        // setgid or sticky needs someone who can write
        if mode & 0o3000 != 0 && !had_w {
            return false;
        }
    } else {
        if mode & 0o6000 != 0 && (!had_x || mode & 0o2 != 0) {
            return false;
        }
        if mode & 0o1000 != 0 {
            return false;
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_common_decimal_mistakes() {
        assert!(is_decimal_mode(644, false));
        assert!(is_decimal_mode(755, false));
        assert!(is_decimal_mode(600, false));
        assert!(is_decimal_mode(755, true));
    }

    #[test]
    fn accepts_octal_values() {
        assert!(!is_decimal_mode(0o644, false));
        assert!(!is_decimal_mode(0o755, true));
        assert!(!is_decimal_mode(420, false));
        assert!(!is_decimal_mode(0, false));
    }

    #[test]
    fn ignores_values_with_non_octal_digits() {
        assert!(!is_decimal_mode(648, false));
        assert!(!is_decimal_mode(8000, false));
        assert!(!is_decimal_mode(-1, false));
    }

    #[test]
    fn directories_need_search_permission() {
        // 0o644 is typical for a file but not for a directory
        assert!(is_typical_mode(0o644, false));
        assert!(!is_typical_mode(0o644, true));
        assert!(is_typical_mode(0o1777, true));
        assert!(!is_typical_mode(0o1644, false));
    }
}
