//! Proves implication and equivalence between sets of allow/deny
//! policies whose fields are typed strings with `*` wildcards.
//!
//! Each field type (`EnumRe`, `CharsetStringRe`, `TupleRe`) denotes a
//! regular language.  A `Policy` fixes one value per field plus a
//! `Decision`, and a `PolicyEquivalenceChecker` turns two policy sets
//! into predicates over one free string variable per field, then asks
//! a `Backend` whether one predicate implies the other.  Failed proofs
//! come with a concrete counterexample.
//!
//! ```
//! use policy_equiv::{
//!     CharSet, Decision, FieldDescriptor, FieldValue, Policy, PolicyEquivalenceChecker,
//!     CharsetStringRe,
//! };
//!
//! let charset = CharSet::from_chars("abc/").unwrap();
//! let shape = vec![
//!     FieldDescriptor::charset_string("path", charset.clone()),
//!     FieldDescriptor::decision("decision"),
//! ];
//! let policy = |path: &str| {
//!     let mut field = CharsetStringRe::new(charset.clone());
//!     field.set_data(path);
//!     Policy::new(
//!         &shape,
//!         vec![
//!             ("path", FieldValue::from(field)),
//!             ("decision", Decision::Allow.into()),
//!         ],
//!     )
//!     .unwrap()
//! };
//!
//! let p = vec![policy("/a/*")];
//! let q = vec![policy("/*")];
//! let mut checker = PolicyEquivalenceChecker::new(regsat::Context::new(), p, q).unwrap();
//! assert!(checker.p_implies_q().is_proved());
//! assert!(!checker.equivalence().is_equivalent());
//! ```
mod backend;
mod budget;
mod checker;
pub mod cloud;
mod config;
mod decision;
mod error;
mod field;
mod outcome;
mod policy;
pub mod re;
pub mod wildcard;

pub use backend::{Backend, SatOutcome};
pub use budget::{CancelFlag, ProofBudget};
pub use checker::PolicyEquivalenceChecker;
pub use config::{CheckerConfig, EmptyAllowPolicy};
pub use decision::Decision;
pub use error::{Error, ErrorCategory};
pub use field::{FieldDescriptor, FieldType};
pub use outcome::{Counterexample, EquivalenceReport, ProofOutcome};
pub use policy::{FieldValue, Policy};
pub use re::{CharSet, CharsetStringRe, EnumRe, ReField, TupleRe};
