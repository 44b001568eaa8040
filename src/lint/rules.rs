//! Individual lint rules over a parsed stylesheet.

use super::RuleSet;
use lightningcss::properties::Property;
use lightningcss::rules::style::StyleRule;
use lightningcss::rules::CssRule;
use lightningcss::stylesheet::PrinterOptions;
use lightningcss::vendor_prefix::VendorPrefix;
use std::collections::HashSet;

/// Names of every rule, in report order.
pub const RULE_NAMES: &[&str] =
    &["important", "empty-rules", "box-sizing", "outline-none", "vendor-prefix"];

/// Pseudo-rule reported when a file does not parse. Cannot be disabled.
pub const PARSE_ERROR: &str = "parse-error";

/// A lint rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Rule {
    /// Declarations using `!important`
    Important,
    /// Style rules with nothing in them
    EmptyRules,
    /// Any use of `box-sizing`
    BoxSizing,
    /// `outline: none` or `outline: 0`, which removes focus indication
    OutlineNone,
    /// Prefixed property with no standard counterpart in the same rule
    VendorPrefix,
}

impl Rule {
    /// All rules, in the same order as [`RULE_NAMES`].
    pub const ALL: [Rule; 5] =
        [Rule::Important, Rule::EmptyRules, Rule::BoxSizing, Rule::OutlineNone, Rule::VendorPrefix];

    /// Rule name as used in configuration.
    pub fn name(self) -> &'static str {
        match self {
            Rule::Important => "important",
            Rule::EmptyRules => "empty-rules",
            Rule::BoxSizing => "box-sizing",
            Rule::OutlineNone => "outline-none",
            Rule::VendorPrefix => "vendor-prefix",
        }
    }

    /// Look up a rule by configuration name.
    pub fn from_name(name: &str) -> Option<Rule> {
        Rule::ALL.into_iter().find(|r| r.name() == name)
    }

    /// Whether the rule runs when nothing configures it.
    ///
    /// `vendor-prefix` is off: generated files keep prefixed fallbacks
    /// without the standard property on purpose.
    pub fn on_by_default(self) -> bool {
        !matches!(self, Rule::VendorPrefix)
    }
}

impl std::fmt::Display for Rule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A rule hit before it is attached to a file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Finding {
    pub rule: Rule,
    /// 1-based line of the enclosing style rule
    pub line: usize,
    pub message: String,
}

/// Run the enabled rules over a list of parsed rules, descending into
/// `@media` and `@supports` blocks and nested style rules.
pub fn check_rules(rules: &[CssRule<'_>], enabled: &RuleSet, findings: &mut Vec<Finding>) {
    for rule in rules {
        match rule {
            CssRule::Style(style) => {
                check_style_rule(style, enabled, findings);
                check_rules(&style.rules.0, enabled, findings);
            }
            CssRule::Media(media) => check_rules(&media.rules.0, enabled, findings),
            CssRule::Supports(supports) => check_rules(&supports.rules.0, enabled, findings),
            _ => {}
        }
    }
}

fn check_style_rule(style: &StyleRule<'_>, enabled: &RuleSet, findings: &mut Vec<Finding>) {
    let line = style.loc.line as usize + 1;
    let block = &style.declarations;
    let mut hit = |rule: Rule, message: String| {
        if enabled.is_enabled(rule) {
            findings.push(Finding { rule, line, message });
        }
    };

    if block.declarations.is_empty()
        && block.important_declarations.is_empty()
        && style.rules.0.is_empty()
    {
        hit(Rule::EmptyRules, "Rule is empty".to_string());
    }

    for property in &block.important_declarations {
        hit(Rule::Important, format!("Use of !important on '{}'", property_name(property)));
    }

    let all: Vec<&Property<'_>> =
        block.declarations.iter().chain(block.important_declarations.iter()).collect();
    let mut standard = HashSet::new();
    for property in &all {
        let (name, prefixed) = split_prefix(property);
        if !prefixed {
            standard.insert(name);
        }
    }

    for property in all {
        let (name, prefixed) = split_prefix(property);

        if name == "box-sizing" {
            hit(Rule::BoxSizing, "The box-sizing property changes the box model".to_string());
        }

        if name == "outline" && removes_outline(property) {
            hit(Rule::OutlineNone, "Outlines should only be removed in a :focus rule".to_string());
        }

        if prefixed && !standard.contains(&name) {
            hit(
                Rule::VendorPrefix,
                format!(
                    "'{}' has no standard property '{}' alongside it",
                    property_name(property),
                    name
                ),
            );
        }
    }
}

/// Property name as written, prefix included.
fn property_name(property: &Property<'_>) -> String {
    let id = property.property_id();
    let name = id.name();
    match prefix_str(id.prefix()) {
        Some(prefix) if !name.starts_with('-') => format!("{}{}", prefix, name),
        _ => name.to_string(),
    }
}

/// Standard property name and whether the declaration carried a vendor prefix.
///
/// Properties lightningcss knows come back unprefixed with a separate prefix
/// flag; unknown ones keep the prefix in their name.
fn split_prefix(property: &Property<'_>) -> (String, bool) {
    let id = property.property_id();
    let name = id.name();
    if prefix_str(id.prefix()).is_some() {
        return (name.to_string(), true);
    }
    for prefix in ["-webkit-", "-moz-", "-ms-", "-o-"] {
        if let Some(stripped) = name.strip_prefix(prefix) {
            return (stripped.to_string(), true);
        }
    }
    (name.to_string(), false)
}

fn prefix_str(prefix: VendorPrefix) -> Option<&'static str> {
    if prefix.contains(VendorPrefix::WebKit) {
        Some("-webkit-")
    } else if prefix.contains(VendorPrefix::Moz) {
        Some("-moz-")
    } else if prefix.contains(VendorPrefix::Ms) {
        Some("-ms-")
    } else if prefix.contains(VendorPrefix::O) {
        Some("-o-")
    } else {
        None
    }
}

fn removes_outline(property: &Property<'_>) -> bool {
    let Ok(value) = property.value_to_css_string(PrinterOptions::default()) else {
        return false;
    };
    value.split_whitespace().any(|token| matches!(token, "none" | "0" | "0px"))
}
