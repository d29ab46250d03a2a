use once_cell::sync::Lazy;
use regex::Regex;

use crate::config::ConfigError;

static PLACEHOLDER: Lazy<Regex> = Lazy::new(|| Regex::new(r"\$\{([^}]*)\}").expect("placeholder pattern"));
static RANGE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*(-?\d+)\s*\.\.\s*(-?\d+)\s*$").expect("range pattern"));
static LIST: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*\[(.*)\]\s*$").expect("list pattern"));

/// Expands groovy-style inline expressions used to describe data nodes.
///
/// `ds_${0..1}.t_order_${[0, 1]}` expands to the Cartesian product of its
/// placeholders, left placeholder varying slowest. Several expressions can be
/// joined with commas.
pub struct InlineExpressionParser;

impl InlineExpressionParser {
    pub fn expand(expression: &str) -> Result<Vec<String>, ConfigError> {
        let mut out = Vec::new();
        for part in Self::split(expression) {
            let part = part.trim();
            if part.is_empty() {
                continue;
            }
            out.extend(Self::expand_one(part)?);
        }
        Ok(out)
    }

    /// Splits on commas that are not inside a placeholder.
    fn split(expression: &str) -> Vec<String> {
        let mut parts = Vec::new();
        let mut current = String::new();
        let mut depth = 0usize;
        let mut previous = '\0';
        for ch in expression.chars() {
            match ch {
                '{' if previous == '$' => depth += 1,
                '}' if depth > 0 => depth -= 1,
                ',' if depth == 0 => {
                    parts.push(std::mem::take(&mut current));
                    previous = ch;
                    continue;
                }
                _ => {}
            }
            current.push(ch);
            previous = ch;
        }
        parts.push(current);
        parts
    }

    fn expand_one(expression: &str) -> Result<Vec<String>, ConfigError> {
        let mut results = vec![String::new()];
        let mut last = 0;
        for caps in PLACEHOLDER.captures_iter(expression) {
            let (Some(whole), Some(content)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            let literal = &expression[last..whole.start()];
            let values = Self::placeholder_values(expression, content.as_str())?;
            results = results
                .iter()
                .flat_map(|prefix| values.iter().map(move |v| format!("{prefix}{literal}{v}")))
                .collect();
            last = whole.end();
        }
        let tail = &expression[last..];
        for result in results.iter_mut() {
            result.push_str(tail);
        }
        Ok(results)
    }

    fn placeholder_values(expression: &str, content: &str) -> Result<Vec<String>, ConfigError> {
        let invalid = |message: &str| ConfigError::InvalidInlineExpression {
            expression: expression.to_string(),
            message: message.to_string(),
        };

        if let Some(caps) = RANGE.captures(content) {
            let from: i64 = caps[1].parse().map_err(|_| invalid("range start is not a number"))?;
            let to: i64 = caps[2].parse().map_err(|_| invalid("range end is not a number"))?;
            if from > to {
                return Err(invalid("range start is greater than its end"));
            }
            return Ok((from..=to).map(|v| v.to_string()).collect());
        }

        if let Some(caps) = LIST.captures(content) {
            let values: Vec<String> = caps[1]
                .split(',')
                .map(|v| v.trim().trim_matches(|c| c == '\'' || c == '"').to_string())
                .filter(|v| !v.is_empty())
                .collect();
            if values.is_empty() {
                return Err(invalid("empty value list"));
            }
            return Ok(values);
        }

        Err(invalid(&format!("unsupported placeholder '${{{content}}}'")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expands_ranges_as_cartesian_product() {
        let nodes = InlineExpressionParser::expand("ds_${0..1}.t_order_${0..1}").expect("valid expression");
        assert_eq!(nodes, vec!["ds_0.t_order_0", "ds_0.t_order_1", "ds_1.t_order_0", "ds_1.t_order_1"]);
    }

    #[test]
    fn expands_lists_and_comma_joined_expressions() {
        let nodes = InlineExpressionParser::expand("ds_0.t_user_${['a', 'b']}, ds_1.t_user_${2..2}").expect("valid expression");
        assert_eq!(nodes, vec!["ds_0.t_user_a", "ds_0.t_user_b", "ds_1.t_user_2"]);
    }

    #[test]
    fn plain_names_pass_through() {
        assert_eq!(InlineExpressionParser::expand("ds_0.t_config").expect("plain"), vec!["ds_0.t_config"]);
    }

    #[test]
    fn rejects_reversed_range_and_unknown_placeholder() {
        assert!(matches!(
            InlineExpressionParser::expand("t_${3..1}"),
            Err(ConfigError::InvalidInlineExpression { .. })
        ));
        assert!(matches!(
            InlineExpressionParser::expand("t_${order_id % 2}"),
            Err(ConfigError::InvalidInlineExpression { .. })
        ));
    }
}
