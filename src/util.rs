//! Small utility helpers used across modules.

/// Log-safe truncation for large strings.
/// Avoids spamming logs with whole input lines.
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

/// Distinct items in first-seen order.
pub fn dedup_first_seen<T, K, F>(items: impl IntoIterator<Item = T>, mut key: F) -> Vec<T>
where
  K: std::hash::Hash + Eq,
  F: FnMut(&T) -> K,
{
  let mut seen = std::collections::HashSet::new();
  items.into_iter().filter(|it| seen.insert(key(it))).collect()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn trunc_respects_char_boundaries() {
    let s = "가나다라";
    let out = trunc_for_log(s, 4);
    assert!(out.starts_with("가"));
    assert!(out.ends_with("(12 bytes total)"));
    assert_eq!(trunc_for_log("short", 10), "short");
  }

  #[test]
  fn dedup_keeps_first_occurrence() {
    let v = dedup_first_seen(vec![(1, "a"), (2, "b"), (1, "c")], |p| p.0);
    assert_eq!(v, vec![(1, "a"), (2, "b")]);
  }
}
