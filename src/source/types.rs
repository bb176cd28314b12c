//! Type definitions and layer call sites.

use std::collections::HashMap;

use itertools::Itertools;
use pest::error::Error;
use pest_consume::{match_nodes, Parser};
use strum_macros::{EnumString, IntoStaticStr};

use super::{code, is_ident_char};

#[derive(Parser)]
#[grammar = "source/syntax.pest"]
struct SourceParser;

type ParseResult<T> = Result<T, Error<Rule>>;
type Node<'i> = pest_consume::Node<'i, Rule, ()>;

/// Arbitrary-precision numeric types understood by the width resolver.
#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumString, IntoStaticStr)]
pub enum NumericKind {
    #[strum(serialize = "ap_fixed")]
    Fixed,
    #[strum(serialize = "ap_ufixed")]
    UFixed,
    #[strum(serialize = "ap_int")]
    Int,
    #[strum(serialize = "ap_uint")]
    UInt,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TypeDef {
    pub name: String,
    pub kind: NumericKind,
    /// Total encoded width in bits.
    pub width: u32,
}

/// A layer invocation `nnet::routine<T1, T2, config>`. The output type is
/// matched but not kept.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CallSite {
    pub routine: String,
    pub input_type: String,
    pub config: String,
}

#[pest_consume::parser]
impl SourceParser {
    fn ident(input: Node) -> ParseResult<String> {
        Ok(input.as_str().to_string())
    }

    fn number(input: Node) -> ParseResult<u32> {
        input.as_str().parse().map_err(|err| input.error(err))
    }

    fn typedef_kw(_input: Node) -> ParseResult<()> {
        Ok(())
    }

    fn numeric_kind(input: Node) -> ParseResult<NumericKind> {
        input.as_str().parse().map_err(|err| input.error(err))
    }

    fn width_typedef(input: Node) -> ParseResult<TypeDef> {
        Ok(match_nodes!(input.into_children();
            [typedef_kw(_), numeric_kind(kind), number(width), ident(name)] => {
                TypeDef { name, kind, width }
            },
        ))
    }

    fn callee(input: Node) -> ParseResult<String> {
        Ok(input.as_str().to_string())
    }

    fn type_arg(input: Node) -> ParseResult<String> {
        Ok(input.as_str().trim().to_string())
    }

    fn call_site(input: Node) -> ParseResult<CallSite> {
        Ok(match_nodes!(input.into_children();
            [callee(routine), type_arg(input_type), type_arg(_), ident(config)] => {
                CallSite { routine, input_type, config }
            },
        ))
    }
}

/// Parses a prefix of `text` as `rule`.
fn parse_prefix<T>(
    rule: Rule,
    text: &str,
    consume: fn(Node) -> ParseResult<T>,
) -> Option<T> {
    let nodes = SourceParser::parse(rule, text).ok()?;

    consume(nodes.single().ok()?).ok()
}

/// Byte offsets at which `keyword` starts a token of `text`.
fn token_starts<'a>(
    text: &'a str,
    keyword: &'a str,
) -> impl Iterator<Item = usize> + 'a {
    text.match_indices(keyword)
        .map(|(pos, _)| pos)
        .filter(|&pos| !text[..pos].ends_with(is_ident_char))
}

/// Width typedefs of the defines header, keyed by type name. The first
/// definition of a name wins.
#[derive(Debug, Default)]
pub struct TypeTable {
    defs: HashMap<String, TypeDef>,
}

impl TypeTable {
    pub fn parse(text: &str) -> TypeTable {
        let mut defs = HashMap::new();

        for line in text.lines().map(code) {
            for pos in token_starts(line, "typedef") {
                let Some(def) = parse_prefix(
                    Rule::width_typedef,
                    &line[pos..],
                    SourceParser::width_typedef,
                ) else {
                    continue;
                };

                if defs.contains_key(&def.name) {
                    continue;
                }

                log::debug!(
                    "Found typedef `{}` = {}<{}>",
                    def.name,
                    <&str>::from(def.kind),
                    def.width,
                );

                defs.insert(def.name.clone(), def);
            }
        }

        TypeTable { defs }
    }

    pub fn get(&self, name: &str) -> Option<&TypeDef> {
        self.defs.get(name)
    }

    pub fn len(&self) -> usize {
        self.defs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.defs.is_empty()
    }
}

/// Layer invocations of the project source, keyed by configuration struct.
/// The first invocation naming a configuration wins.
#[derive(Debug, Default)]
pub struct CallSites {
    sites: HashMap<String, CallSite>,
}

impl CallSites {
    pub fn parse(text: &str) -> CallSites {
        let text = text.lines().map(code).join("\n");
        let mut sites = HashMap::new();

        for pos in token_starts(&text, "nnet::") {
            let Some(site) = parse_prefix(
                Rule::call_site,
                &text[pos..],
                SourceParser::call_site,
            ) else {
                continue;
            };

            if sites.contains_key(&site.config) {
                continue;
            }

            log::debug!(
                "Found `{}` call on `{}` configured by `{}`",
                site.routine,
                site.input_type,
                site.config,
            );

            sites.insert(site.config.clone(), site);
        }

        CallSites { sites }
    }

    pub fn get(&self, config: &str) -> Option<&CallSite> {
        self.sites.get(config)
    }

    pub fn len(&self) -> usize {
        self.sites.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sites.is_empty()
    }
}
