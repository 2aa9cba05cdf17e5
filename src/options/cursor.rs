use super::{SEPARATOR, is_numeric, split_options};
use crate::error::OptionsError;

/// A consuming view over an option-token array.
///
/// Every successful lookup marks the tokens it read as consumed, so repeated lookups of the same
/// name walk through repeated occurrences in order. Lookups never look past the first unconsumed
/// [`SEPARATOR`]; the tokens behind it belong to a base learner and are claimed with
/// [`OptionCursor::take_trailing`].
#[derive(Debug, Clone, Default)]
pub struct OptionCursor {
    tokens: Vec<String>,
    consumed: Vec<bool>,
}

impl OptionCursor {
    pub fn new<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let tokens: Vec<String> = tokens.into_iter().map(Into::into).collect();
        let consumed = vec![false; tokens.len()];
        Self { tokens, consumed }
    }

    /// Builds a cursor from a command-line string.
    pub fn parse(input: &str) -> Result<Self, OptionsError> {
        Ok(Self::new(split_options(input)?))
    }

    fn position(&self, name: &str) -> Option<usize> {
        for (i, token) in self.tokens.iter().enumerate() {
            if self.consumed[i] {
                continue;
            }
            if token == SEPARATOR {
                return None;
            }
            if token.len() > 1
                && token.starts_with('-')
                && !is_numeric(token)
                && &token[1..] == name
            {
                return Some(i);
            }
        }
        None
    }

    /// Consumes the switch `-name`, returning whether it was present.
    pub fn take_flag(&mut self, name: &str) -> bool {
        match self.position(name) {
            Some(i) => {
                self.consumed[i] = true;
                true
            }
            None => false,
        }
    }

    /// Consumes `-name value` and returns the value, or `None` if the option is absent.
    pub fn take_option(&mut self, name: &str) -> Result<Option<String>, OptionsError> {
        let Some(i) = self.position(name) else {
            return Ok(None);
        };
        if i + 1 >= self.tokens.len() || self.consumed[i + 1] {
            return Err(OptionsError::MissingValue(name.to_string()));
        }
        self.consumed[i] = true;
        self.consumed[i + 1] = true;
        Ok(Some(self.tokens[i + 1].clone()))
    }

    /// Consumes every occurrence of `-name value`, preserving their order.
    pub fn take_all(&mut self, name: &str) -> Result<Vec<String>, OptionsError> {
        let mut values = Vec::new();
        while let Some(value) = self.take_option(name)? {
            values.push(value);
        }
        Ok(values)
    }

    /// Consumes the first unconsumed separator and returns every token behind it.
    ///
    /// Returns an empty vector when no separator is left.
    pub fn take_trailing(&mut self) -> Vec<String> {
        let start = (0..self.tokens.len())
            .find(|&i| !self.consumed[i] && self.tokens[i] == SEPARATOR);
        let Some(start) = start else {
            return Vec::new();
        };
        let trailing = self.tokens[start + 1..].to_vec();
        for flag in &mut self.consumed[start..] {
            *flag = true;
        }
        trailing
    }

    /// Tokens that have not been consumed yet, in their original order.
    pub fn remaining(&self) -> Vec<String> {
        self.tokens
            .iter()
            .zip(&self.consumed)
            .filter(|(_, consumed)| !**consumed)
            .map(|(token, _)| token.clone())
            .collect()
    }

    pub fn is_exhausted(&self) -> bool {
        self.consumed.iter().all(|c| *c)
    }
}
