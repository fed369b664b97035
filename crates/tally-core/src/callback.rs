//! Callback intents
//!
//! Button clicks arrive as an opaque string (the chat platform caps it at
//! 64 bytes). Instead of ad hoc prefix parsing scattered through handlers,
//! the intent is a closed enum encoded/decoded once at the boundary.

use crate::analytics::{Period, ViewKind};

/// What a button click means, decoded from its callback token
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallbackIntent {
    /// Redraw the analytics message with a different view/period
    View { view: ViewKind, period: Period },
    /// Drill into one owner's records. The prefix is the (possibly
    /// truncated) button label, matched against owner names by prefix.
    DrillUser { prefix: String, period: Period },
    /// Mark a goal done by its opaque id
    CompleteGoal { id: String },
}

impl CallbackIntent {
    /// Compact token encoding, guaranteed under the 64-byte cap for every
    /// payload we emit (user prefixes are pre-truncated on a byte budget,
    /// goal ids are 8 hex chars)
    pub fn encode(&self) -> String {
        match self {
            CallbackIntent::View { view, period } => {
                format!("v:{}:{}", view.code(), period.code())
            }
            CallbackIntent::DrillUser { prefix, period } => {
                format!("u:{}:{}", period.code(), prefix)
            }
            CallbackIntent::CompleteGoal { id } => format!("g:{}", id),
        }
    }

    /// Decode a token; unknown shapes yield None and the click is only
    /// acknowledged
    pub fn decode(token: &str) -> Option<Self> {
        let (kind, rest) = token.split_once(':')?;
        match kind {
            "v" => {
                let (view, period) = rest.split_once(':')?;
                Some(CallbackIntent::View {
                    view: ViewKind::from_code(view)?,
                    period: Period::from_code(period)?,
                })
            }
            "u" => {
                let (period, prefix) = rest.split_once(':')?;
                Some(CallbackIntent::DrillUser {
                    prefix: prefix.to_string(),
                    period: Period::from_code(period)?,
                })
            }
            "g" => Some(CallbackIntent::CompleteGoal {
                id: rest.to_string(),
            }),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_view_round_trip() {
        let intent = CallbackIntent::View {
            view: ViewKind::Category,
            period: Period::LastMonth,
        };
        assert_eq!(CallbackIntent::decode(&intent.encode()), Some(intent));
    }

    #[test]
    fn test_drill_round_trip_keeps_colon_free_prefix() {
        let intent = CallbackIntent::DrillUser {
            prefix: "Alice".into(),
            period: Period::CurrentMonth,
        };
        let token = intent.encode();
        assert!(token.len() <= 64);
        assert_eq!(CallbackIntent::decode(&token), Some(intent));
    }

    #[test]
    fn test_goal_round_trip() {
        let intent = CallbackIntent::CompleteGoal { id: "a1b2c3d4".into() };
        assert_eq!(CallbackIntent::decode(&intent.encode()), Some(intent));
    }

    #[test]
    fn test_unknown_tokens_decode_to_none() {
        assert_eq!(CallbackIntent::decode("x:makes:no:sense"), None);
        assert_eq!(CallbackIntent::decode("v:zz:m"), None);
        assert_eq!(CallbackIntent::decode(""), None);
    }
}
