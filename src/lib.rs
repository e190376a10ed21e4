pub mod activation;
pub mod builder;
pub mod constraint;
pub mod driver;
pub mod error;
pub mod ident;
pub mod litmap;
pub mod persistence;
pub mod problem;
pub mod resolver;
pub mod sat;
pub mod source;
pub mod value;
pub mod variable;

pub use constraint::{AppliedConstraint, Constraint};
pub use error::{ResolutionError, Result};
pub use ident::Identifier;
pub use problem::Problem;
pub use resolver::{Resolver, ResolverOptions, Solution};
pub use variable::Variable;
