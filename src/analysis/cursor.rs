//! The caller-facing token sequence

use crate::analysis::error::StreamError;
use crate::analysis::stream::BoxTokenStream;
use crate::analysis::token::{Token, TokenRecord};
use std::iter::FusedIterator;
use tracing::debug;

/// A lazy, finite, non-restartable sequence of tokens from one stream.
///
/// The stage chain is dropped as soon as the sequence ends or fails, and at
/// the latest when the cursor itself is dropped. After an error the cursor
/// is finished: the error is yielded once and nothing follows it.
pub struct TokenCursor {
    chain: Option<BoxTokenStream>,
    produced: usize,
}

impl TokenCursor {
    pub fn new(chain: BoxTokenStream) -> Self {
        TokenCursor {
            chain: Some(chain),
            produced: 0,
        }
    }

    /// Next token, with offsets.
    pub fn advance_token(&mut self) -> Result<Option<Token>, StreamError> {
        let Some(chain) = self.chain.as_mut() else {
            return Ok(None);
        };
        match chain.advance() {
            Ok(Some(token)) => {
                self.produced += 1;
                Ok(Some(token))
            }
            Ok(None) => {
                self.release();
                Ok(None)
            }
            Err(e) => {
                self.release();
                Err(e)
            }
        }
    }

    /// Next token record.
    pub fn advance(&mut self) -> Result<Option<TokenRecord>, StreamError> {
        Ok(self.advance_token()?.map(TokenRecord::from))
    }

    pub fn is_finished(&self) -> bool {
        self.chain.is_none()
    }

    /// Tokens yielded so far.
    pub fn produced(&self) -> usize {
        self.produced
    }

    fn release(&mut self) {
        if self.chain.take().is_some() {
            debug!(produced = self.produced, "released stage chain");
        }
    }
}

impl Iterator for TokenCursor {
    type Item = Result<TokenRecord, StreamError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.advance().transpose()
    }
}

impl FusedIterator for TokenCursor {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::stream::TokenStream;

    /// Yields `ok` tokens, then fails forever.
    struct Failing {
        ok: usize,
    }

    impl TokenStream for Failing {
        fn advance(&mut self) -> Result<Option<Token>, StreamError> {
            if self.ok == 0 {
                return Err(StreamError::stage("failing", "boom"));
            }
            self.ok -= 1;
            Ok(Some(Token::new("t", "word", 0, 1)))
        }
    }

    #[test]
    fn test_error_is_terminal() {
        let mut cursor = TokenCursor::new(Box::new(Failing { ok: 1 }));
        assert!(matches!(cursor.next(), Some(Ok(_))));
        assert!(matches!(cursor.next(), Some(Err(StreamError::Stage { .. }))));
        assert!(cursor.is_finished());
        assert!(cursor.next().is_none());
        assert!(cursor.next().is_none());
        assert_eq!(cursor.produced(), 1);
    }
}
