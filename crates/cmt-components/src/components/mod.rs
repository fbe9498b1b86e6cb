mod clock;
mod relaxation;

pub use clock::{ClockComponent, ClockParameters};
pub use relaxation::{RelaxationComponent, RelaxationParameters};
