use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

pub const OTP_LENGTH: usize = 6;

/// Pause between the sixth digit landing and the automatic verify call.
pub const AUTO_SUBMIT_DELAY: Duration = Duration::from_millis(300);

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum OtpInputError {
    #[error("digit position {0} is out of range")]
    OutOfRange(usize),

    #[error("{0:?} is not a digit")]
    NotADigit(char),
}

/// Six single-digit slots.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OtpInput {
    digits: [Option<char>; OTP_LENGTH],
}

impl OtpInput {
    /// Place `ch` at `index`. Returns `true` when this completed the code.
    pub fn set_digit(&mut self, index: usize, ch: char) -> Result<bool, OtpInputError> {
        if index >= OTP_LENGTH {
            return Err(OtpInputError::OutOfRange(index));
        }
        if !ch.is_ascii_digit() {
            return Err(OtpInputError::NotADigit(ch));
        }

        let was_complete = self.is_complete();
        self.digits[index] = Some(ch);
        Ok(!was_complete && self.is_complete())
    }

    pub fn clear_digit(&mut self, index: usize) -> Result<(), OtpInputError> {
        let slot = self
            .digits
            .get_mut(index)
            .ok_or(OtpInputError::OutOfRange(index))?;
        *slot = None;
        Ok(())
    }

    /// Fill slots from the digits of pasted text, ignoring separators.
    pub fn paste(&mut self, text: &str) -> bool {
        self.clear();
        for (slot, ch) in self
            .digits
            .iter_mut()
            .zip(text.chars().filter(char::is_ascii_digit))
        {
            *slot = Some(ch);
        }
        self.is_complete()
    }

    pub fn clear(&mut self) {
        self.digits = [None; OTP_LENGTH];
    }

    pub fn filled(&self) -> usize {
        self.digits.iter().filter(|d| d.is_some()).count()
    }

    pub fn is_complete(&self) -> bool {
        self.filled() == OTP_LENGTH
    }

    /// The entered code, once every slot holds a digit.
    pub fn code(&self) -> Option<String> {
        self.digits.iter().copied().collect()
    }
}
