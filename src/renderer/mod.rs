//! Responsible for rendering VTL templates

mod call_stack;
mod for_loop;
mod processor;
mod stack_frame;

pub use self::processor::Processor;

#[cfg(test)]
mod tests;
