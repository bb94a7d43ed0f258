//! Small utility helpers used across modules.

/// Very small and safe string templating.
/// Replaces occurrences of `{key}` in the template with provided values.
///
/// Substitution is single-pass: a value that itself contains `{key}` text is
/// copied as-is and never expanded again. Unknown `{...}` groups are kept.
pub fn fill_template(tpl: &str, pairs: &[(&str, &str)]) -> String {
  let mut out = String::with_capacity(tpl.len() + pairs.iter().map(|(_, v)| v.len()).sum::<usize>());
  let mut rest = tpl;

  while let Some(open) = rest.find('{') {
    out.push_str(&rest[..open]);
    let after = &rest[open + 1..];
    let replaced = after.find('}').and_then(|close| {
      let key = &after[..close];
      pairs
        .iter()
        .find(|(k, _)| *k == key)
        .map(|(_, v)| (*v, close))
    });

    match replaced {
      Some((value, close)) => {
        out.push_str(value);
        rest = &after[close + 1..];
      }
      None => {
        out.push('{');
        rest = after;
      }
    }
  }
  out.push_str(rest);
  out
}

/// True if the string has no visible content.
pub fn is_blank(s: &str) -> bool {
  s.trim().is_empty()
}

/// Log-safe truncation for large strings.
/// Avoids spamming logs with huge request/response payloads.
pub fn trunc_for_log(s: &str, max: usize) -> String {
  if s.len() <= max {
    return s.to_string();
  }
  let mut cut = max;
  while !s.is_char_boundary(cut) {
    cut -= 1;
  }
  format!("{}… ({} bytes total)", &s[..cut], s.len())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn fills_known_keys() {
    let out = fill_template("Vak: {subject}, klas {grade}", &[("subject", "Wiskunde"), ("grade", "5")]);
    assert_eq!(out, "Vak: Wiskunde, klas 5");
  }

  #[test]
  fn values_are_not_expanded_twice() {
    let out = fill_template("{exercise} / {custom}", &[("exercise", "zie {custom}"), ("custom", "groter")]);
    assert_eq!(out, "zie {custom} / groter");
  }

  #[test]
  fn unknown_and_unclosed_braces_are_kept() {
    assert_eq!(fill_template("a {x} b {", &[("y", "1")]), "a {x} b {");
    assert_eq!(fill_template("{{k}}", &[("k", "v")]), "{v}");
  }

  #[test]
  fn truncation_respects_char_boundaries() {
    let s = "🟢🟢🟢";
    let t = trunc_for_log(s, 5);
    assert!(t.starts_with("🟢"));
    assert!(t.ends_with("(12 bytes total)"));
    assert_eq!(trunc_for_log("kort", 10), "kort");
  }

  #[test]
  fn blank_detection() {
    assert!(is_blank("  \n\t"));
    assert!(!is_blank(" a "));
  }
}
