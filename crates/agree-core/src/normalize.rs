//! Text normalisation for submitted statement content.
//!
//! Statements read as the tail of the sentence "we agree that...", so the
//! stored form drops a single trailing period and lower-cases the first
//! letter unless the first word looks like a proper noun or an acronym.

/// First words that keep their capitalisation.
const PROPER_NOUNS: &[&str] = &[
  "I",
  // Months
  "January", "February", "March", "April", "May", "June", "July", "August",
  "September", "October", "November", "December",
  // Days
  "Monday", "Tuesday", "Wednesday", "Thursday", "Friday", "Saturday", "Sunday",
  // Places and nationalities
  "America", "American", "Asia", "Asian", "Europe", "European", "Africa",
  "African", "Australia", "Australian", "Canada", "Canadian", "Mexico",
  "Mexican",
  // Religious figures
  "God", "Allah", "Buddha", "Jesus", "Christ", "Muhammad",
  // Languages
  "English", "Spanish", "French", "German", "Chinese", "Japanese",
];

/// Canonicalise raw submitted text into stored statement content.
///
/// Pure and total: any input maps to some output, and empty input maps to
/// empty output. Rejecting blank content is the caller's job (see
/// [`crate::statement::Content::parse`]).
pub fn normalize(raw: &str) -> String {
  let text = raw.strip_suffix('.').unwrap_or(raw);

  let mut words = text.split_whitespace();
  let Some(first) = words.next() else {
    return text.to_owned();
  };

  let mut out = String::with_capacity(text.len());
  if keeps_capitals(first) {
    out.push_str(first);
  } else {
    let mut chars = first.chars();
    if let Some(c) = chars.next() {
      out.extend(c.to_lowercase());
      out.push_str(chars.as_str());
    }
  }

  for word in words {
    out.push(' ');
    out.push_str(word);
  }
  out
}

fn keeps_capitals(word: &str) -> bool {
  is_acronym(word) || PROPER_NOUNS.contains(&word)
}

/// Two or more characters, none of which change when upper-cased.
fn is_acronym(word: &str) -> bool {
  word.chars().count() > 1 && word.to_uppercase() == word
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn strips_trailing_period_and_lowercases() {
    assert_eq!(normalize("The world is round."), "the world is round");
  }

  #[test]
  fn strips_exactly_one_period() {
    assert_eq!(normalize("wait for it.."), "wait for it.");
    assert_eq!(normalize("really?"), "really?");
    assert_eq!(normalize("yes!"), "yes!");
  }

  #[test]
  fn keeps_acronyms() {
    assert_eq!(normalize("NASA explores space"), "NASA explores space");
  }

  #[test]
  fn keeps_first_person_pronoun() {
    assert_eq!(normalize("I like pizza"), "I like pizza");
  }

  #[test]
  fn keeps_proper_nouns() {
    assert_eq!(normalize("Monday is great"), "Monday is great");
    assert_eq!(normalize("January is cold"), "January is cold");
    assert_eq!(normalize("America is diverse."), "America is diverse");
  }

  #[test]
  fn lowercases_ordinary_words() {
    assert_eq!(normalize("People are kind"), "people are kind");
  }

  #[test]
  fn single_letter_is_lowercased() {
    assert_eq!(normalize("A cat sat"), "a cat sat");
  }

  #[test]
  fn only_the_first_letter_changes() {
    assert_eq!(normalize("McDonald's fries are salty"), "mcDonald's fries are salty");
  }

  #[test]
  fn whitespace_runs_collapse_on_rejoin() {
    assert_eq!(normalize("  The   sky\tis blue "), "the sky is blue");
  }

  #[test]
  fn empty_and_blank_input() {
    assert_eq!(normalize(""), "");
    assert_eq!(normalize("."), "");
    assert_eq!(normalize("   "), "   ");
  }

  #[test]
  fn idempotent_on_normalized_text() {
    let once = normalize("The world is round.");
    assert_eq!(normalize(&once), once);
  }
}
