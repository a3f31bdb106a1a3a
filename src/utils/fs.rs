//! Path display helpers

/// Shortens a path for display by keeping its trailing components
///
/// Leading components are replaced by `.../` until the result fits in
/// `max_length` characters. The last component is always kept whole.
pub fn shorten_path(path: &str, max_length: usize) -> String {
    if path.chars().count() <= max_length {
        return path.to_string();
    }

    let components: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    let Some((last, parents)) = components.split_last() else {
        return path.to_string();
    };

    let mut tail = (*last).to_string();
    for parent in parents.iter().rev() {
        let candidate = format!("{parent}/{tail}");
        // 4 = ".../"
        if candidate.chars().count() + 4 > max_length {
            break;
        }
        tail = candidate;
    }

    if tail.chars().count() == path.trim_start_matches('/').chars().count() {
        return path.to_string();
    }
    format!(".../{tail}")
}
