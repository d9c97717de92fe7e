//! Translation of locator kinds into driver-level CSS and XPath queries.
//!
//! Each kind enumerates its candidates with one query; the geometric
//! filtering in [`resolve`](crate::resolve) happens afterwards, on the
//! driver side of the wire. Text matching rules differ by kind: visible-text
//! kinds (text, link, list item) match exactly after whitespace
//! normalisation, label-ish kinds (button, text field, combo box, checkbox,
//! radio button, file input, image) match their labels case-insensitively.

use crate::locator::{Kind, Locator};

/// Input types that behave as free-text fields.
const TEXT_INPUT_TYPES: &[&str] = &["text", "password", "email", "number", "tel", "url", "search"];

/// A ready-to-run driver query.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Query {
    Css(String),
    XPath(String),
}

impl Query {
    pub(crate) fn as_fantoccini(&self) -> fantoccini::Locator<'_> {
        match self {
            Query::Css(css) => fantoccini::Locator::Css(css),
            Query::XPath(xpath) => fantoccini::Locator::XPath(xpath),
        }
    }

    pub(crate) fn as_str(&self) -> &str {
        match self {
            Query::Css(css) => css,
            Query::XPath(xpath) => xpath,
        }
    }
}

/// Quote a string as an XPath 1.0 literal.
///
/// XPath 1.0 has no escape syntax inside string literals, so a value mixing
/// both quote characters has to be assembled with `concat()`.
pub(crate) fn xpath_literal(value: &str) -> String {
    if !value.contains('\'') {
        return format!("'{value}'");
    }
    if !value.contains('"') {
        return format!("\"{value}\"");
    }
    let mut parts = Vec::new();
    for (i, chunk) in value.split('\'').enumerate() {
        if i > 0 {
            parts.push("\"'\"".to_string());
        }
        if !chunk.is_empty() {
            parts.push(format!("'{chunk}'"));
        }
    }
    format!("concat({})", parts.join(", "))
}

/// Lower-case an XPath expression. XPath 1.0 has no `lower-case()`;
/// `translate()` covers the ASCII range, which is what labels use.
pub(crate) fn lowercase(expr: &str) -> String {
    format!("translate({expr}, 'ABCDEFGHIJKLMNOPQRSTUVWXYZ', 'abcdefghijklmnopqrstuvwxyz')")
}

/// Join sub-conditions into one bracketed XPath predicate.
///
/// Empty conditions are dropped; no surviving conditions means no predicate
/// at all, so the bare element test matches everything of its kind.
pub(crate) fn predicate_or<I, S>(conditions: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let joined = conditions
        .into_iter()
        .filter(|c| !c.as_ref().is_empty())
        .map(|c| c.as_ref().to_string())
        .collect::<Vec<_>>()
        .join(" or ");
    if joined.is_empty() {
        String::new()
    } else {
        format!("[{joined}]")
    }
}

/// Condition matching a lower-cased attribute against a lower-cased label.
fn attr_equals_ci(attr: &str, lowered_literal: &str) -> String {
    format!("{} = {}", lowercase(&format!("@{attr}")), lowered_literal)
}

/// Condition linking a control to a `<label for=…>` with the given text.
fn label_for_condition(lowered_literal: &str) -> String {
    format!(
        "@id = //label[{} = {}]/@for",
        lowercase("normalize-space(.)"),
        lowered_literal
    )
}

/// XPath arm matching controls nested inside a matching `<label>`.
fn label_wrap_arm(control: &str, lowered_literal: &str) -> String {
    format!(
        "//label[{} = {}]//{control}",
        lowercase("normalize-space(.)"),
        lowered_literal
    )
}

/// Element test for text-like inputs. An `<input>` without a `type`
/// attribute defaults to a text field.
fn text_input_test() -> String {
    let mut conditions = vec!["not(@type)".to_string()];
    conditions.extend(TEXT_INPUT_TYPES.iter().map(|t| format!("@type = '{t}'")));
    format!("input{}", predicate_or(conditions))
}

fn button_test() -> String {
    "input[@type = 'submit' or @type = 'button' or @type = 'reset']".to_string()
}

/// Build the candidate-enumeration query for a locator.
pub(crate) fn query_for(locator: &Locator) -> Query {
    match locator.kind() {
        Kind::Selector => selector_query(locator.needle().unwrap_or("")),
        Kind::Text => text_query(locator.needle()),
        Kind::Link => visible_text_query("a", locator.needle()),
        Kind::ListItem => visible_text_query("li", locator.needle()),
        Kind::Button => button_query(locator.needle()),
        Kind::Image => image_query(locator.needle()),
        Kind::TextField => labelled_control_query(&text_input_test(), Some("textarea"), locator.needle()),
        Kind::ComboBox => labelled_control_query("select", None, locator.needle()),
        Kind::CheckBox => labelled_input_query("checkbox", false, locator.needle()),
        Kind::RadioButton => labelled_input_query("radio", true, locator.needle()),
        Kind::FileInput => labelled_input_query("file", false, locator.needle()),
    }
}

/// Raw selectors go through unchanged, except for two shorthands: `@foo`
/// matches by `name` attribute and anything XPath-shaped runs as XPath.
fn selector_query(raw: &str) -> Query {
    if let Some(name) = raw.strip_prefix('@') {
        return Query::XPath(format!("//*[@name = {}]", xpath_literal(name)));
    }
    if raw.starts_with("//") || raw.starts_with("./") || raw.starts_with('(') {
        return Query::XPath(raw.to_string());
    }
    Query::Css(raw.to_string())
}

fn text_query(needle: Option<&str>) -> Query {
    match needle {
        Some(text) => {
            let literal = xpath_literal(text);
            let predicate = predicate_or([
                format!("normalize-space(text()) = {literal}"),
                format!("@value = {literal}"),
            ]);
            Query::XPath(format!("//*{predicate}"))
        }
        None => Query::XPath("//*[normalize-space(text()) != '']".to_string()),
    }
}

/// Links and list items match their visible text exactly, modulo
/// surrounding whitespace.
fn visible_text_query(tag: &str, needle: Option<&str>) -> Query {
    match needle {
        Some(text) => {
            let literal = xpath_literal(text);
            let predicate = predicate_or([format!("normalize-space(.) = {literal}")]);
            Query::XPath(format!("//{tag}{predicate}"))
        }
        None => Query::XPath(format!("//{tag}")),
    }
}

fn button_query(needle: Option<&str>) -> Query {
    let input_test = button_test();
    match needle {
        Some(label) => {
            let lowered = xpath_literal(&label.to_lowercase());
            let by_text = predicate_or([
                format!("{} = {}", lowercase("normalize-space(.)"), lowered),
                attr_equals_ci("aria-label", &lowered),
            ]);
            let by_value = predicate_or([
                attr_equals_ci("value", &lowered),
                attr_equals_ci("aria-label", &lowered),
            ]);
            let arms = [
                format!("//button{by_text}"),
                format!("//{input_test}{by_value}"),
                format!("//*[@role = 'button']{by_text}"),
            ];
            Query::XPath(arms.join(" | "))
        }
        None => Query::XPath(format!(
            "//button | //{input_test} | //*[@role = 'button']"
        )),
    }
}

fn image_query(needle: Option<&str>) -> Query {
    match needle {
        Some(alt) => {
            let lowered = xpath_literal(&alt.to_lowercase());
            let predicate = predicate_or([attr_equals_ci("alt", &lowered)]);
            Query::XPath(format!("//img{predicate}"))
        }
        None => Query::XPath("//img".to_string()),
    }
}

/// Inputs, textareas, and selects found by label text, placeholder, name,
/// or `aria-label`. Covers both `<label for=…>` and label-wrapped markup.
fn labelled_control_query(control: &str, extra_control: Option<&str>, needle: Option<&str>) -> Query {
    match needle {
        Some(label) => {
            let lowered = xpath_literal(&label.to_lowercase());
            let predicate = predicate_or([
                attr_equals_ci("aria-label", &lowered),
                attr_equals_ci("placeholder", &lowered),
                attr_equals_ci("name", &lowered),
                label_for_condition(&lowered),
            ]);
            let mut arms = vec![
                format!("//{control}{predicate}"),
                label_wrap_arm(control, &lowered),
            ];
            if let Some(extra) = extra_control {
                arms.push(format!("//{extra}{predicate}"));
                arms.push(label_wrap_arm(extra, &lowered));
            }
            Query::XPath(arms.join(" | "))
        }
        None => match extra_control {
            Some(extra) => Query::XPath(format!("//{control} | //{extra}")),
            None => Query::XPath(format!("//{control}")),
        },
    }
}

/// Inputs of a fixed `type` (checkbox, radio, file) identified by their
/// attributes or an associated label. Radio buttons additionally match on
/// their `value` attribute, the conventional place for the option label.
fn labelled_input_query(input_type: &str, match_value: bool, needle: Option<&str>) -> Query {
    let control = format!("input[@type = '{input_type}']");
    match needle {
        Some(label) => {
            let lowered = xpath_literal(&label.to_lowercase());
            let mut conditions = vec![
                attr_equals_ci("aria-label", &lowered),
                attr_equals_ci("name", &lowered),
                label_for_condition(&lowered),
            ];
            if match_value {
                conditions.push(attr_equals_ci("value", &lowered));
            }
            let predicate = predicate_or(conditions);
            let arms = [
                format!("//{control}{predicate}"),
                label_wrap_arm(&control, &lowered),
            ];
            Query::XPath(arms.join(" | "))
        }
        None => Query::XPath(format!("//{control}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literals_prefer_single_quotes() {
        assert_eq!(xpath_literal("plain"), "'plain'");
    }

    #[test]
    fn literals_with_an_apostrophe_switch_to_double_quotes() {
        assert_eq!(xpath_literal("it's"), "\"it's\"");
    }

    #[test]
    fn literals_with_both_quote_kinds_use_concat() {
        assert_eq!(
            xpath_literal(r#"say "don't""#),
            r#"concat('say "don', "'", 't"')"#
        );
    }

    #[test]
    fn predicate_join_with_no_conditions_is_empty() {
        assert_eq!(predicate_or(Vec::<String>::new()), "");
    }

    #[test]
    fn predicate_join_with_one_condition_brackets_it() {
        assert_eq!(predicate_or(["a = b"]), "[a = b]");
    }

    #[test]
    fn predicate_join_with_two_conditions_uses_or() {
        assert_eq!(predicate_or(["a = b", "c = d"]), "[a = b or c = d]");
    }

    #[test]
    fn predicate_join_drops_empty_conditions() {
        assert_eq!(predicate_or(["", "a = b", ""]), "[a = b]");
    }

    #[test]
    fn at_prefixed_selectors_match_by_name() {
        assert_eq!(
            selector_query("@q"),
            Query::XPath("//*[@name = 'q']".to_string())
        );
    }

    #[test]
    fn xpath_shaped_selectors_pass_through_as_xpath() {
        assert_eq!(
            selector_query("//div[@id = 'x']"),
            Query::XPath("//div[@id = 'x']".to_string())
        );
        assert_eq!(
            selector_query("(//tr)[2]"),
            Query::XPath("(//tr)[2]".to_string())
        );
    }

    #[test]
    fn everything_else_is_css() {
        assert_eq!(
            selector_query("input[type=file]"),
            Query::Css("input[type=file]".to_string())
        );
        assert_eq!(selector_query("#main .row"), Query::Css("#main .row".to_string()));
    }

    #[test]
    fn text_queries_match_normalised_text_or_value() {
        let q = query_for(&Locator::text("Sign in"));
        assert_eq!(
            q,
            Query::XPath(
                "//*[normalize-space(text()) = 'Sign in' or @value = 'Sign in']".to_string()
            )
        );
    }

    #[test]
    fn link_queries_are_exact_on_visible_text() {
        let q = query_for(&Locator::link("Forgot password?"));
        assert_eq!(
            q,
            Query::XPath("//a[normalize-space(.) = 'Forgot password?']".to_string())
        );
    }

    #[test]
    fn button_queries_cover_buttons_inputs_and_roles() {
        let q = query_for(&Locator::button("Log In"));
        let xpath = q.as_str();
        assert!(xpath.contains("//button["));
        assert!(xpath.contains("//input[@type = 'submit'"));
        assert!(xpath.contains("//*[@role = 'button']"));
        // Labels are compared lower-cased on both sides.
        assert!(xpath.contains("'log in'"));
        assert!(!xpath.contains("'Log In'"));
    }

    #[test]
    fn unlabelled_buttons_enumerate_every_button_shape() {
        let q = query_for(&Locator::any(Kind::Button));
        assert_eq!(
            q.as_str(),
            "//button | //input[@type = 'submit' or @type = 'button' or @type = 'reset'] \
             | //*[@role = 'button']"
        );
    }

    #[test]
    fn text_field_queries_cover_labels_in_both_markup_styles() {
        let q = query_for(&Locator::text_field("Email"));
        let xpath = q.as_str();
        assert!(xpath.contains("@id = //label["));
        assert!(xpath.contains("//label[") && xpath.contains("]//input"));
        assert!(xpath.contains("//textarea"));
        assert!(xpath.contains("not(@type)"));
        assert!(xpath.contains("@type = 'password'"));
    }

    #[test]
    fn combo_box_queries_target_selects() {
        let q = query_for(&Locator::combo_box("Language"));
        let xpath = q.as_str();
        assert!(xpath.starts_with("//select["));
        assert!(xpath.contains("]//select"));
    }

    #[test]
    fn radio_buttons_also_match_their_value_attribute() {
        let radio = query_for(&Locator::radio_button("Female"));
        assert!(radio.as_str().contains("@value"));
        let check = query_for(&Locator::check_box("Subscribe"));
        assert!(!check.as_str().contains("@value"));
    }

    #[test]
    fn file_input_queries_find_labelled_file_inputs() {
        let q = query_for(&Locator::file_input("Please select a file:"));
        let xpath = q.as_str();
        assert!(xpath.starts_with("//input[@type = 'file']["));
        assert!(xpath.contains("@id = //label["));
        assert!(xpath.contains("]//input[@type = 'file']"));
        assert!(xpath.contains("'please select a file:'"));
        // Text-field type tests must not leak in; only file inputs qualify.
        assert!(!xpath.contains("@type = 'text'"));
    }

    #[test]
    fn unlabelled_text_queries_match_any_element_with_text() {
        let q = query_for(&Locator::any(Kind::Text));
        assert_eq!(
            q,
            Query::XPath("//*[normalize-space(text()) != '']".to_string())
        );
    }
}
