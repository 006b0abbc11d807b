use embedded_hal::digital::{ErrorType, InputPin, OutputPin};

/// A matrix line: a GPIO that can be reconfigured between input and output
/// at runtime.
///
/// Every row and column line idles as a floating input. During a sweep the
/// scanner temporarily turns one line into an output driven low
/// (`set_as_output` + `set_low`), samples the sense lines with `is_low`, and
/// floats the line again with `set_as_input`. Sense lines are put into
/// pull-up mode once at initialization, so an open switch reads high and a
/// switch shorted to the driven line reads low.
pub trait Line: ErrorType + InputPin + OutputPin {
    /// Configure the line as a floating input, its deactivated state.
    fn set_as_input(&mut self);

    /// Configure the line as an input with the internal pull-up enabled.
    fn set_as_input_pullup(&mut self);

    /// Configure the line as an output.
    fn set_as_output(&mut self);
}
