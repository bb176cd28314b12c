//! Configuration fields of a struct body.
//!
//! Fields are read from single lines of the form `... name = value;` or
//! `typedef target name;`. Lines that begin with a comment are skipped and
//! trailing comments are stripped before matching, so commented-out
//! assignments never take effect.

use super::{code, is_ident_char, COMMENT};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FieldKind {
    /// `name = true;` or `name = false;`
    Bool,
    /// `name = 42;`
    Int,
    /// `typedef target name;`
    Typedef,
}

/// A named field together with the shape of its value.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Field {
    pub name: &'static str,
    pub kind: FieldKind,
}

impl Field {
    pub const fn bool(name: &'static str) -> Field {
        Field {
            name,
            kind: FieldKind::Bool,
        }
    }

    pub const fn int(name: &'static str) -> Field {
        Field {
            name,
            kind: FieldKind::Int,
        }
    }

    pub const fn typedef(name: &'static str) -> Field {
        Field {
            name,
            kind: FieldKind::Typedef,
        }
    }

    /// Reads the field from a comment-free line of code.
    fn read<'src>(&self, line: &'src str) -> Option<Value<'src>> {
        match self.kind {
            FieldKind::Bool => match assignment(line, self.name)? {
                "true" => Some(Value::Bool(true)),
                "false" => Some(Value::Bool(false)),
                _ => None,
            },
            FieldKind::Int => {
                let value = assignment(line, self.name)?;

                if value.bytes().all(|b| b.is_ascii_digit()) {
                    value.parse().ok().map(Value::Int)
                } else {
                    None
                }
            }
            FieldKind::Typedef => typedef(line, self.name).map(Value::Ident),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Value<'src> {
    Bool(bool),
    Int(u64),
    Ident(&'src str),
}

/// The code lines of a struct body, with comments removed.
pub struct Annotations<'src> {
    lines: Vec<&'src str>,
}

impl<'src> Annotations<'src> {
    pub fn new<I>(lines: I) -> Annotations<'src>
    where
        I: IntoIterator<Item = &'src str>,
    {
        let lines = lines
            .into_iter()
            .map(str::trim)
            .filter(|line| !line.starts_with(COMMENT))
            .map(code)
            .filter(|line| !line.trim().is_empty())
            .collect();

        Annotations { lines }
    }

    /// Iterates over every well-formed occurrence of `field`, in line order.
    pub fn values(&self, field: Field) -> impl Iterator<Item = Value<'src>> + '_ {
        self.lines.iter().filter_map(move |&line| field.read(line))
    }

    /// Checks for an assignment `name = true;`.
    pub fn has_flag(&self, name: &'static str) -> bool {
        self.values(Field::bool(name))
            .any(|value| value == Value::Bool(true))
    }

    /// Checks for an assignment `name = n;` with `n > 0`.
    pub fn has_count(&self, name: &'static str) -> bool {
        self.values(Field::int(name))
            .any(|value| matches!(value, Value::Int(n) if n > 0))
    }

    /// Returns the first integer assigned to `name`, or `default`.
    pub fn int_value(&self, name: &'static str, default: u64) -> u64 {
        self.values(Field::int(name))
            .find_map(|value| match value {
                Value::Int(n) => Some(n),
                _ => None,
            })
            .unwrap_or(default)
    }

    /// Returns the aliased type of the first `typedef target name;`.
    pub fn typedef_target(&self, name: &'static str) -> Option<&'src str> {
        self.values(Field::typedef(name))
            .find_map(|value| match value {
                Value::Ident(target) => Some(target),
                _ => None,
            })
    }
}

/// Finds `name = value;` in `line`, with `name` as a whole identifier, and
/// returns the trimmed value.
fn assignment<'src>(line: &'src str, name: &str) -> Option<&'src str> {
    line.match_indices(name).find_map(|(pos, _)| {
        let before = line[..pos].chars().next_back();

        if before.is_some_and(is_ident_char) {
            return None;
        }

        let rest = line[pos + name.len()..].trim_start().strip_prefix('=')?;
        let (value, _) = rest.split_once(';')?;

        Some(value.trim())
    })
}

/// Matches a line of the form `typedef target name;`.
fn typedef<'src>(line: &'src str, name: &str) -> Option<&'src str> {
    let rest = line.trim().strip_prefix("typedef")?;

    if !rest.starts_with(char::is_whitespace) {
        return None;
    }

    let rest = rest.trim_start();
    let end = rest.find(|c: char| !is_ident_char(c)).unwrap_or(rest.len());
    let (target, rest) = rest.split_at(end);

    if target.is_empty() || !rest.starts_with(char::is_whitespace) {
        return None;
    }

    let rest = rest.trim_start().strip_prefix(name)?;

    rest.trim_start().starts_with(';').then_some(target)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn annotations(text: &str) -> Annotations<'_> {
        Annotations::new(text.lines())
    }

    #[test]
    fn trailing_comment_does_not_mask_assignment() {
        let body = annotations("ram_add = true; // disabled: ram_add = false;");

        assert!(body.has_flag("ram_add"));
    }

    #[test]
    fn commented_assignment_is_ignored() {
        assert!(!annotations("// ram_add = true;").has_flag("ram_add"));
        assert!(!annotations("  // ram_add = true;").has_flag("ram_add"));
        assert!(!annotations("int x; // ram_add = true;").has_flag("ram_add"));
    }

    #[test]
    fn flags() {
        let body = annotations(concat!(
            "struct config2 : nnet::dense_config {\n",
            "    static const bool ram_add = false;\n",
            "    static const bool dual_port_add = true;\n",
            "    static const bool lut_ram_add = true;\n",
            "    static const bool ram_add = true ;\n",
            "};\n",
        ));

        assert!(body.has_flag("ram_add"));
        assert!(body.has_flag("dual_port_add"));
        assert!(body.has_flag("lut_ram_add"));
        assert!(!body.has_flag("dual_port_muls"));
    }

    #[test]
    fn names_match_whole_identifiers() {
        let body = annotations("static const bool lut_ram_add = true;");

        assert!(!body.has_flag("ram_add"));
        assert!(!body.has_flag("lut_ram"));
        assert!(body.has_flag("lut_ram_add"));
    }

    #[test]
    fn counts() {
        assert!(annotations("static const unsigned ram_muls = 3;")
            .has_count("ram_muls"));
        assert!(!annotations("static const unsigned ram_muls = 0;")
            .has_count("ram_muls"));
        assert!(!annotations("static const unsigned ram_muls = -1;")
            .has_count("ram_muls"));
        assert!(!annotations("static const unsigned ram_muls = n;")
            .has_count("ram_muls"));
        assert!(annotations("ram_muls = 0;\nram_muls = 2;")
            .has_count("ram_muls"));
    }

    #[test]
    fn integer_values() {
        let body = annotations(concat!(
            "// ram_partition_factor_muls = 8;\n",
            "static const unsigned ram_partition_factor_muls = 4;\n",
            "static const unsigned ram_partition_factor_muls = 2;\n",
        ));

        assert_eq!(body.int_value("ram_partition_factor_muls", 1), 4);
        assert_eq!(body.int_value("ram_partition_factor_add", 1), 1);
    }

    #[test]
    fn typedef_targets() {
        let body = annotations(concat!(
            "    // typedef stale_t weight_t;\n",
            "    typedef model_default_t accum_t; // accumulator\n",
            "    typedef weight2_t weight_t;\n",
            "    typedef ap_fixed<16,6> bias_t;\n",
        ));

        assert_eq!(body.typedef_target("weight_t"), Some("weight2_t"));
        assert_eq!(body.typedef_target("accum_t"), Some("model_default_t"));
        assert_eq!(body.typedef_target("bias_t"), None);
        assert_eq!(body.typedef_target("index_t"), None);
    }

    #[test]
    fn typedef_requires_exact_field() {
        assert_eq!(typedef("typedef a_t weight_type;", "weight_t"), None);
        assert_eq!(typedef("typedefa_t weight_t;", "weight_t"), None);
        assert_eq!(typedef("typedef a_t weight_t", "weight_t"), None);
        assert_eq!(typedef("typedef a_t weight_t ;", "weight_t"), Some("a_t"));
    }
}
