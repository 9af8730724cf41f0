const MAX_SUGGESTION_DISTANCE: usize = 2;

pub fn best_suggestion<'a>(value: &str, candidates: &'a [&'a str]) -> Option<&'a str> {
    let value_norm = value.trim().to_ascii_lowercase();
    if value_norm.is_empty() {
        return None;
    }

    let mut best: Option<(&str, usize)> = None;
    for candidate in candidates {
        let distance = levenshtein(&value_norm, &candidate.to_ascii_lowercase());
        match best {
            Some((_, best_distance)) if distance >= best_distance => {}
            _ => best = Some((candidate, distance)),
        }
    }

    best.and_then(|(candidate, distance)| {
        if distance <= MAX_SUGGESTION_DISTANCE {
            Some(candidate)
        } else {
            None
        }
    })
}

/// Renders `kind: message`, the offending input quoted on its own line and
/// an optional `help:` trailer.
pub fn render_diagnostic(
    kind: &str,
    message: &str,
    input: Option<&str>,
    hint: Option<&str>,
) -> String {
    let mut rendered = format!("{kind}: {message}");

    if let Some(text) = input {
        rendered.push('\n');
        rendered.push_str(&format!("   | {text}"));
    }

    if let Some(hint_text) = hint
        && !hint_text.is_empty()
    {
        rendered.push('\n');
        rendered.push_str(&format!("help: {hint_text}"));
    }

    rendered
}

fn levenshtein(left: &str, right: &str) -> usize {
    if left == right {
        return 0;
    }
    if left.is_empty() {
        return right.chars().count();
    }
    if right.is_empty() {
        return left.chars().count();
    }

    let right_chars: Vec<char> = right.chars().collect();
    let mut prev: Vec<usize> = (0..=right_chars.len()).collect();
    let mut curr = vec![0usize; right_chars.len() + 1];

    for (i, left_char) in left.chars().enumerate() {
        curr[0] = i + 1;
        for (j, right_char) in right_chars.iter().enumerate() {
            let cost = usize::from(left_char != *right_char);
            curr[j + 1] = (prev[j + 1] + 1).min(curr[j] + 1).min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[right_chars.len()]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn best_suggestion_matches_transposed_layout() {
        let suggestion = best_suggestion("NCWH", &["NCHW", "NHWC", "OIHW"]);
        assert_eq!(suggestion, Some("NCHW"));
    }

    #[test]
    fn best_suggestion_ignores_far_symbol() {
        let suggestion = best_suggestion("XYZQ", &["NCHW", "NHWC", "OIHW"]);
        assert_eq!(suggestion, None);
    }

    #[test]
    fn axis_swap_costs_two_edits() {
        assert_eq!(levenshtein("nchw", "nchw"), 0);
        assert_eq!(levenshtein("nchw", "nhwc"), 2);
        assert_eq!(levenshtein("hwio", "hwoi"), 2);
        assert_eq!(levenshtein("oihw", ""), 4);
    }

    #[test]
    fn render_diagnostic_includes_input_and_help() {
        let rendered = render_diagnostic(
            "Layout error",
            "unknown base layout",
            Some("NCWH4c"),
            Some("did you mean 'NCHW'?"),
        );
        assert!(rendered.starts_with("Layout error: unknown base layout"));
        assert!(rendered.contains("| NCWH4c"));
        assert!(rendered.contains("help: did you mean 'NCHW'?"));
    }
}
