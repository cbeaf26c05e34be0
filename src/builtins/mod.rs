/// Methods callable on template references
pub mod methods;
