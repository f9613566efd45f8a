/// Characters dropped before two strings are compared.
pub const STRIPPED_PUNCTUATION: &[char] = &[
    '.', ',', '/', '#', '!', '$', '%', '^', '&', '*', ';', ':', '{', '}', '=', '-', '_', '`',
    '~', '(', ')',
];

/// Canonicalize text for answer checking.
///
/// Removes the characters in [`STRIPPED_PUNCTUATION`], collapses every run of two
/// or more whitespace characters into a single space, trims both ends and
/// lowercases what is left. A lone whitespace character between words is kept
/// as-is, so `"cat dog"` and `"catdog"` never compare equal.
pub fn normalize(input: &str) -> String {
    let stripped: Vec<char> = input
        .chars()
        .filter(|c| !STRIPPED_PUNCTUATION.contains(c))
        .collect();

    let mut collapsed = String::with_capacity(stripped.len());
    let mut run_start: Option<usize> = None;

    for (i, &c) in stripped.iter().enumerate() {
        if c.is_whitespace() {
            run_start.get_or_insert(i);
            continue;
        }
        if let Some(start) = run_start.take() {
            push_whitespace_run(&mut collapsed, &stripped[start..i]);
        }
        collapsed.push(c);
    }
    if let Some(start) = run_start {
        push_whitespace_run(&mut collapsed, &stripped[start..]);
    }

    collapsed.trim().to_lowercase()
}

fn push_whitespace_run(out: &mut String, run: &[char]) {
    if run.len() >= 2 {
        out.push(' ');
    } else {
        out.extend(run);
    }
}

/// Exact comparison after [`normalize`]. There is no partial credit.
pub fn matches(recognized: &str, expected: &str) -> bool {
    normalize(recognized) == normalize(expected)
}
