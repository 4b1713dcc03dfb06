use sha2::{Digest, Sha256};

const MAX_STEM_LEN: usize = 80;
const PDF_EXTENSION: &str = ".pdf";

/// Local name for a processed result: the server's file name when given,
/// otherwise `optimized_<original>`. Always Windows-safe and `.pdf`.
pub fn result_file_name(server_name: Option<&str>, original_name: &str, job_id: &str) -> String {
    let candidate = match server_name {
        Some(name) => name.trim().to_string(),
        None if !original_name.trim().is_empty() => format!("optimized_{}", original_name.trim()),
        None => String::new(),
    };

    let mut stem = sanitize_stem(without_pdf_extension(&candidate));
    if stem.is_empty() {
        stem = format!("pagepress-{}", job_tag(job_id));
    }
    stem + PDF_EXTENSION
}

fn without_pdf_extension(name: &str) -> &str {
    let split = name.len().saturating_sub(PDF_EXTENSION.len());
    match name.get(split..) {
        Some(tail) if tail.eq_ignore_ascii_case(PDF_EXTENSION) => &name[..split],
        _ => name,
    }
}

fn sanitize_stem(input: &str) -> String {
    // Servers sometimes echo a path; only the last component is a name.
    let base = input.rsplit(['/', '\\']).next().unwrap_or(input);

    let mut cleaned = String::with_capacity(base.len());
    for c in base.chars() {
        let c = if is_unsafe(c) { '_' } else { c };
        if c == '_' && cleaned.ends_with('_') {
            continue;
        }
        cleaned.push(c);
    }

    let mut stem = cleaned
        .trim_matches(|c| matches!(c, '_' | ' ' | '.'))
        .to_string();
    if stem.len() > MAX_STEM_LEN {
        let cut = (0..=MAX_STEM_LEN)
            .rev()
            .find(|index| stem.is_char_boundary(*index))
            .unwrap_or(0);
        stem.truncate(cut);
    }
    if is_device_name(&stem) {
        stem.push('_');
    }
    stem
}

fn is_unsafe(c: char) -> bool {
    c.is_control() || r#"\/:*?"<>|"#.contains(c)
}

/// Names Windows reserves for devices.
fn is_device_name(stem: &str) -> bool {
    let upper = stem.to_ascii_uppercase();
    match upper.as_bytes() {
        [a, b, c] => matches!(&[*a, *b, *c], b"CON" | b"PRN" | b"AUX" | b"NUL"),
        [a, b, c, digit] => {
            matches!(&[*a, *b, *c], b"COM" | b"LPT") && matches!(*digit, b'1'..=b'9')
        }
        _ => false,
    }
}

fn job_tag(job_id: &str) -> String {
    Sha256::digest(job_id.as_bytes())
        .iter()
        .take(4)
        .map(|byte| format!("{byte:02x}"))
        .collect()
}
