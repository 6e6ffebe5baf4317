//!  Wayfarer Trip Planner
//!
//!  Copyright (C) 2026  Mamy Ratsimbazafy
//!
//!  This program is free software: you can redistribute it and/or modify
//!  it under the terms of the GNU Affero General Public License as published by
//!  the Free Software Foundation, either version 3 of the License, or
//!  (at your option) any later version.
//!
//!  This program is distributed in the hope that it will be useful,
//!  but WITHOUT ANY WARRANTY; without even the implied warranty of
//!  MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
//!  GNU Affero General Public License for more details.
//!
//!  You should have received a copy of the GNU Affero General Public License
//!  along with this program.  If not, see <http://www.gnu.org/licenses/>.

//! Three-way step result used by the planning pipeline.

use crate::errors::PlannerError;

/// Result of one pipeline step.
///
/// `Fallback` carries a usable value plus the reason it is degraded; only
/// `Fatal` stops the run.
#[derive(Debug)]
pub enum Outcome<T> {
    Ok(T),
    Fallback { value: T, reason: String },
    Fatal(PlannerError),
}

impl<T> Outcome<T> {
    pub fn fallback(value: T, reason: impl Into<String>) -> Self {
        Self::Fallback {
            value,
            reason: reason.into(),
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, Self::Fallback { .. })
    }

    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Fatal(_))
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Outcome<U> {
        match self {
            Self::Ok(v) => Outcome::Ok(f(v)),
            Self::Fallback { value, reason } => Outcome::Fallback {
                value: f(value),
                reason,
            },
            Self::Fatal(e) => Outcome::Fatal(e),
        }
    }

    /// Split into the value and the optional degradation reason, or the fatal error.
    pub fn into_parts(self) -> Result<(T, Option<String>), PlannerError> {
        match self {
            Self::Ok(v) => Ok((v, None)),
            Self::Fallback { value, reason } => Ok((value, Some(reason))),
            Self::Fatal(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ProviderError;

    #[test]
    fn test_into_parts() {
        let (v, reason) = Outcome::Ok(1).into_parts().unwrap();
        assert_eq!((v, reason), (1, None));

        let degraded = Outcome::fallback("#", "no token").map(str::to_string);
        assert!(degraded.is_fallback());
        let (v, reason) = degraded.into_parts().unwrap();
        assert_eq!(v, "#");
        assert_eq!(reason.as_deref(), Some("no token"));

        let fatal: Outcome<()> = Outcome::Fatal(ProviderError::Api("bad key".into()).into());
        assert!(fatal.is_fatal());
        assert!(fatal.into_parts().is_err());
    }
}
