//! Resolve anonymous peer-review labels back to model names

use std::collections::BTreeMap;

use crate::state::{Label, ModelName};

/// Display name for a model identifier: the part after the last `/`
pub fn short_model_name(model: &str) -> &str {
    model.rsplit_once('/').map_or(model, |(_, name)| name)
}

/// Emphasized display form used in deanonymized text
fn emphasized(model: &str) -> String {
    format!("**{}**", short_model_name(model))
}

/// Replace every label occurrence with the emphasized short model name
///
/// Single left-to-right pass; at each position the longest matching label
/// wins, so `Response A` never clobbers the front of `Response AB`.
/// Replacement text is never rescanned.
pub fn deanonymize(text: &str, label_to_model: &BTreeMap<Label, ModelName>) -> String {
    let mut labels: Vec<(&str, &str)> = label_to_model
        .iter()
        .filter(|(label, _)| !label.is_empty())
        .map(|(label, model)| (label.as_str(), model.as_str()))
        .collect();
    if labels.is_empty() {
        return text.to_string();
    }
    labels.sort_by(|a, b| b.0.len().cmp(&a.0.len()).then_with(|| a.0.cmp(b.0)));

    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while !rest.is_empty() {
        match labels.iter().find(|(label, _)| rest.starts_with(label)) {
            Some((label, model)) => {
                out.push_str(&emphasized(model));
                rest = &rest[label.len()..];
            }
            None => {
                let mut chars = rest.chars();
                if let Some(c) = chars.next() {
                    out.push(c);
                }
                rest = chars.as_str();
            }
        }
    }
    out
}

/// Sequential global replacement, one label at a time in map order
///
/// Kept for parity with saved transcripts rendered the old way. The result
/// depends on label order when one label is a prefix of another: with
/// `Response A` and `Response AB`, the shorter label replaces the front of
/// the longer one first.
pub fn deanonymize_legacy(text: &str, label_to_model: &BTreeMap<Label, ModelName>) -> String {
    label_to_model
        .iter()
        .filter(|(label, _)| !label.is_empty())
        .fold(text.to_string(), |acc, (label, model)| {
            acc.replace(label.as_str(), &emphasized(model))
        })
}

/// Map a parsed ranking to display names; unknown labels pass through
pub fn resolve_ranking(parsed: &[Label], label_to_model: &BTreeMap<Label, ModelName>) -> Vec<String> {
    parsed
        .iter()
        .map(|label| match label_to_model.get(label) {
            Some(model) => short_model_name(model).to_string(),
            None => label.clone(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(pairs: &[(&str, &str)]) -> BTreeMap<Label, ModelName> {
        pairs
            .iter()
            .map(|(l, m)| (l.to_string(), m.to_string()))
            .collect()
    }

    #[test]
    fn test_short_model_name() {
        assert_eq!(short_model_name("openai/gpt-5.1"), "gpt-5.1");
        assert_eq!(short_model_name("org/sub/model"), "model");
        assert_eq!(short_model_name("local-model"), "local-model");
    }

    #[test]
    fn test_every_label_replaced_globally() {
        let map = labels(&[("Response A", "org/modelX"), ("Response B", "org/modelY")]);
        let text = "Response A beats Response B. Response A is more precise.";

        let out = deanonymize(text, &map);
        assert_eq!(
            out,
            "**modelX** beats **modelY**. **modelX** is more precise."
        );
        assert!(!out.contains("Response A"));
        assert!(!out.contains("Response B"));
    }

    #[test]
    fn test_longest_label_wins() {
        let map = labels(&[("Response A", "p/short"), ("Response AB", "p/long")]);
        let out = deanonymize("Response AB then Response A", &map);
        assert_eq!(out, "**long** then **short**");

        let legacy = deanonymize_legacy("Response AB then Response A", &map);
        assert_eq!(legacy, "**short**B then **short**");
    }

    #[test]
    fn test_text_without_labels_unchanged() {
        let map = labels(&[("Response A", "p/m")]);
        let text = "Nothing to see: ünïcödé";
        assert_eq!(deanonymize(text, &map), text);
        assert_eq!(deanonymize(text, &BTreeMap::new()), text);
    }

    #[test]
    fn test_legacy_matches_on_disjoint_labels() {
        let map = labels(&[
            ("Response A", "a/one"),
            ("Response B", "b/two"),
            ("Response C", "c/three"),
        ]);
        let texts = [
            "FINAL RANKING:\n1. Response C\n2. Response A\n3. Response B",
            "Response B and Response B again",
            "",
        ];
        for text in texts {
            assert_eq!(deanonymize(text, &map), deanonymize_legacy(text, &map));
        }
    }

    #[test]
    fn test_resolve_ranking_passes_unknown_through() {
        let map = labels(&[("Response A", "a/one"), ("Response B", "b/two")]);
        let parsed = vec![
            "Response B".to_string(),
            "Response Z".to_string(),
            "Response A".to_string(),
        ];
        assert_eq!(
            resolve_ranking(&parsed, &map),
            vec!["two", "Response Z", "one"]
        );
    }
}
