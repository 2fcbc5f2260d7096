//! Shortcode signatures and argument binding
//!
//! A [`Signature`] is the part of a shortcode the dispatcher understands: its name, its
//! declared [`Input`]s and its [`Binding`] mode. Binding turns the raw tokens of a tag into
//! [`Arguments`]; rejoining turns arguments back into canonical tag text.
//!
//! Binding modes
//!
//!     Positional: `[%link http://example.com/ "some text" %]`. Tokens bind to inputs by
//!     index. More tokens than inputs is an error; missing trailing inputs take their default.
//!     Only a trailing run of inputs may declare defaults, so this is never ambiguous.
//!
//!     Keyword: `[%link url=http://example.com/ text="some text" %]`. Tokens bind by key in
//!     any order. What happens to undeclared keys, and which pairs rejoin omits, is set by the
//!     [`KeywordPolicy`].

use crate::error::{Result, ShortcodeError};
use crate::input::Input;
use crate::quote::quote;
use crate::tag::TagArgs;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::HashSet;

/// Which pairs a keyword rejoin leaves out
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Rejoin {
    /// Skip pairs whose value equals the input's default (empty when none is declared)
    #[default]
    OmitDefaults,
    /// Skip only empty values
    OmitEmpty,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeywordPolicy {
    /// Fail on keys that are not declared inputs; otherwise keep them in [`Arguments::extra`]
    pub reject_unknown: bool,
    pub rejoin: Rejoin,
}

impl Default for KeywordPolicy {
    fn default() -> Self {
        KeywordPolicy {
            reject_unknown: true,
            rejoin: Rejoin::OmitDefaults,
        }
    }
}

/// How tag arguments bind to declared inputs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Binding {
    Positional,
    Keyword(KeywordPolicy),
}

impl Binding {
    /// Keyword binding with the default policy
    pub fn keyword() -> Self {
        Binding::Keyword(KeywordPolicy::default())
    }
}

/// Values bound to a shortcode's inputs, in declaration order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Arguments {
    values: Vec<(String, String)>,
    extra: Vec<(String, String)>,
}

impl Arguments {
    pub fn new(values: Vec<(String, String)>) -> Self {
        Arguments {
            values,
            extra: Vec::new(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.values
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Value of the input declared at `index`
    pub fn get_index(&self, index: usize) -> Option<&str> {
        self.values.get(index).map(|(_, value)| value.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Bound values without their names
    pub fn values(&self) -> impl Iterator<Item = &str> {
        self.values.iter().map(|(_, v)| v.as_str())
    }

    /// Undeclared keyword arguments kept under a lenient [`KeywordPolicy`]
    pub fn extra(&self) -> &[(String, String)] {
        &self.extra
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Name, inputs and binding mode of one shortcode
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    name: String,
    inputs: Vec<Input>,
    binding: Binding,
}

impl Signature {
    /// Build and validate a signature.
    ///
    /// Fails with [`ShortcodeError::InvalidInput`] when the name is empty or contains
    /// whitespace or `%]`, when two inputs share a name, when an input is both required and
    /// defaulted, or when a positional signature has a default on a non-trailing input.
    pub fn new(name: impl Into<String>, inputs: Vec<Input>, binding: Binding) -> Result<Self> {
        let name = name.into();
        if name.is_empty()
            || name.starts_with('%')
            || name.contains("%]")
            || name.chars().any(char::is_whitespace)
        {
            return Err(ShortcodeError::invalid_input(
                &name,
                "shortcode names must be non-empty, contain no whitespace and no `%]`",
            ));
        }

        let mut seen = HashSet::new();
        for input in &inputs {
            if !seen.insert(input.name.as_str()) {
                return Err(ShortcodeError::invalid_input(
                    &name,
                    format!("input {} is declared more than once", input.name),
                ));
            }
            if input.required && input.default.is_some() {
                return Err(ShortcodeError::invalid_input(
                    &name,
                    format!("input {} is required and cannot have a default", input.name),
                ));
            }
        }

        if binding == Binding::Positional {
            let mut default_allowed = true;
            for input in inputs.iter().rev() {
                match &input.default {
                    None => default_allowed = false,
                    Some(default) if !default_allowed => {
                        return Err(ShortcodeError::invalid_input(
                            &name,
                            format!(
                                "only trailing inputs can have default values: {} has default {} but is not trailing",
                                input.name, default
                            ),
                        ));
                    }
                    Some(_) => {}
                }
            }
        }

        Ok(Signature {
            name,
            inputs,
            binding,
        })
    }

    pub fn positional(name: impl Into<String>, inputs: Vec<Input>) -> Result<Self> {
        Self::new(name, inputs, Binding::Positional)
    }

    pub fn keyword(name: impl Into<String>, inputs: Vec<Input>) -> Result<Self> {
        Self::new(name, inputs, Binding::keyword())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn inputs(&self) -> &[Input] {
        &self.inputs
    }

    pub fn binding(&self) -> Binding {
        self.binding
    }

    pub fn input(&self, name: &str) -> Option<&Input> {
        self.inputs.iter().find(|input| input.name == name)
    }

    /// Bind the tokens of one tag to the declared inputs
    pub fn bind(&self, args: TagArgs) -> Result<Arguments> {
        match self.binding {
            Binding::Positional => self.bind_positional(args),
            Binding::Keyword(policy) => self.bind_keyword(args, policy),
        }
    }

    fn bind_positional(&self, args: TagArgs) -> Result<Arguments> {
        if !args.keywords.is_empty() {
            return Err(ShortcodeError::InvalidKeywords {
                name: self.name.clone(),
                keys: args.keywords.into_iter().map(|(key, _)| key).collect(),
                allowed: Vec::new(),
            });
        }
        if args.positional.len() > self.inputs.len() {
            return Err(ShortcodeError::ExtraParameters {
                name: self.name.clone(),
                count: args.positional.len(),
                expected: self.inputs.len(),
            });
        }

        let mut supplied = args.positional.into_iter();
        let values = self
            .inputs
            .iter()
            .map(|input| {
                let value = supplied.next();
                self.resolve(input, value).map(|v| (input.name.clone(), v))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Arguments::new(values))
    }

    fn bind_keyword(&self, args: TagArgs, policy: KeywordPolicy) -> Result<Arguments> {
        if !args.positional.is_empty() {
            return Err(ShortcodeError::ExtraParameters {
                name: self.name.clone(),
                count: args.positional.len(),
                expected: 0,
            });
        }

        let (declared, extra): (Vec<_>, Vec<_>) = args
            .keywords
            .into_iter()
            .partition(|(key, _)| self.input(key).is_some());
        if policy.reject_unknown && !extra.is_empty() {
            return Err(ShortcodeError::InvalidKeywords {
                name: self.name.clone(),
                keys: extra.into_iter().map(|(key, _)| key).collect(),
                allowed: self.inputs.iter().map(|i| i.name.clone()).collect(),
            });
        }

        let mut declared = declared;
        let values = self
            .inputs
            .iter()
            .map(|input| {
                let value = declared
                    .iter()
                    .position(|(key, _)| *key == input.name)
                    .map(|at| declared.swap_remove(at).1);
                self.resolve(input, value).map(|v| (input.name.clone(), v))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Arguments { values, extra })
    }

    /// Resolve every declared input against already-bound `args`.
    ///
    /// Inputs absent from `args` take their default; a required input that is absent or
    /// empty fails with [`ShortcodeError::MissingInput`]. Extra arguments carry over.
    pub fn fill(&self, args: &Arguments) -> Result<Arguments> {
        let values = self
            .inputs
            .iter()
            .map(|input| {
                let value = args.get(&input.name).map(str::to_string);
                self.resolve(input, value).map(|v| (input.name.clone(), v))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Arguments {
            values,
            extra: args.extra.clone(),
        })
    }

    fn resolve(&self, input: &Input, value: Option<String>) -> Result<String> {
        match value {
            Some(value) if !value.is_empty() || !input.required => Ok(value),
            _ if input.required => Err(ShortcodeError::MissingInput {
                name: self.name.clone(),
                input: input.name.clone(),
            }),
            _ => Ok(input.resolved_default().to_string()),
        }
    }

    /// Serialize arguments back into canonical tag text.
    ///
    /// Inputs missing from `args` rejoin as empty values.
    pub fn rejoin(&self, args: &Arguments) -> String {
        let parts = match self.binding {
            Binding::Positional => self.rejoin_positional(args),
            Binding::Keyword(policy) => self.rejoin_keyword(args, policy.rejoin),
        };
        if parts.is_empty() {
            format!("[%{} %]", self.name)
        } else {
            format!("[%{} {} %]", self.name, parts.join(" "))
        }
    }

    fn rejoin_positional(&self, args: &Arguments) -> Vec<String> {
        let mut values: Vec<&str> = self
            .inputs
            .iter()
            .map(|input| args.get(&input.name).unwrap_or(""))
            .collect();
        while let Some(last) = values.last() {
            if *last != self.inputs[values.len() - 1].resolved_default() {
                break;
            }
            values.pop();
        }
        values
            .into_iter()
            .map(|value| match quote(value) {
                Cow::Borrowed(bare) if bare.contains('=') => format!("\"{bare}\""),
                quoted => quoted.into_owned(),
            })
            .collect()
    }

    fn rejoin_keyword(&self, args: &Arguments, rejoin: Rejoin) -> Vec<String> {
        self.inputs
            .iter()
            .filter_map(|input| {
                let value = args.get(&input.name).unwrap_or("");
                let omit = match rejoin {
                    Rejoin::OmitDefaults => value == input.resolved_default(),
                    Rejoin::OmitEmpty => value.is_empty(),
                };
                (!omit).then(|| format!("{}={}", input.name, quote(value)))
            })
            .collect()
    }
}
