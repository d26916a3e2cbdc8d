//! Interactive control widgets.
//!
//! Everything here follows the same degrade-don't-crash policy: a
//! malformed attribute value is logged and the control keeps its previous
//! (or default) state; rendering never halts on bad markup.

pub mod button;
pub mod dial;
pub mod gauge;
pub mod theme_switch;

pub use button::{ActionButton, action_button};
pub use dial::{ValueDial, value_dial};
pub use gauge::{LedGauge, led_gauge};
pub use theme_switch::{ThemeSwitch, theme_switch};

use trellis_core::error::ValidationError;

pub(crate) fn parse_number(attribute: &'static str, value: &str) -> Result<f64, ValidationError> {
    let parsed: f64 = value
        .trim()
        .parse()
        .map_err(|_| ValidationError::new(attribute, value, "expected a number"))?;
    if parsed.is_finite() {
        Ok(parsed)
    } else {
        Err(ValidationError::new(attribute, value, "expected a finite number"))
    }
}
