//! A policy is one rule: a concrete value for each regex field of a
//! declared shape, plus the decision taken when every field matches.
use crate::decision::Decision;
use crate::error::Error;
use crate::field::{FieldDescriptor, FieldType};
use crate::re::{CharsetStringRe, EnumRe, ReField, TupleRe};
use std::collections::{BTreeMap, BTreeSet};

/// The value supplied for one field of a policy.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum FieldValue {
    Decision(Decision),
    Re(ReField),
}

impl FieldValue {
    fn kind_name(&self) -> &'static str {
        match self {
            FieldValue::Decision(_) => FieldType::Decision.kind_name(),
            FieldValue::Re(ReField::Enum(_)) => "an enum",
            FieldValue::Re(ReField::CharsetString(_)) => "a charset string",
            FieldValue::Re(ReField::Tuple(_)) => "a tuple",
        }
    }
}

impl From<Decision> for FieldValue {
    fn from(decision: Decision) -> Self {
        FieldValue::Decision(decision)
    }
}

impl From<ReField> for FieldValue {
    fn from(field: ReField) -> Self {
        FieldValue::Re(field)
    }
}

impl From<EnumRe> for FieldValue {
    fn from(field: EnumRe) -> Self {
        FieldValue::Re(field.into())
    }
}

impl From<CharsetStringRe> for FieldValue {
    fn from(field: CharsetStringRe) -> Self {
        FieldValue::Re(field.into())
    }
}

impl From<TupleRe> for FieldValue {
    fn from(field: TupleRe) -> Self {
        FieldValue::Re(field.into())
    }
}

/// An immutable, validated policy.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Policy {
    decision_field: String,
    decision: Decision,
    /// Non-decision descriptors, in declared order.
    fields: Vec<FieldDescriptor>,
    /// One attached instance per entry of `fields`.
    values: Vec<ReField>,
}

impl Policy {
    /// Builds a policy of shape `descriptors` from one value per
    /// declared field name.
    ///
    /// # Errors
    ///
    /// - `InvalidPolicyStructure` unless exactly one descriptor is a
    ///   decision, if names are empty or repeated, or if `values` names
    ///   an undeclared field or the same field twice;
    /// - `MissingPolicyField` if a declared field has no value;
    /// - `InvalidPolicyFieldType` if a value's type (or universe)
    ///   differs from its descriptor's;
    /// - `MissingData` if a regex value has nothing attached.
    pub fn new<I, S>(descriptors: &[FieldDescriptor], values: I) -> Result<Self, Error>
    where
        I: IntoIterator<Item = (S, FieldValue)>,
        S: Into<String>,
    {
        let decision_field = validate_shape(descriptors)?;

        let mut provided = BTreeMap::new();
        for (name, value) in values {
            let name = name.into();
            if !descriptors.iter().any(|descriptor| descriptor.name == name) {
                return Err(Error::InvalidPolicyStructure(format!(
                    "value supplied for undeclared field {}",
                    name
                )));
            }

            if provided.contains_key(&name) {
                return Err(Error::InvalidPolicyStructure(format!(
                    "field {} supplied twice",
                    name
                )));
            }

            provided.insert(name, value);
        }

        let mut decision = None;
        let mut fields = Vec::with_capacity(descriptors.len().saturating_sub(1));
        let mut re_values = Vec::with_capacity(fields.capacity());
        for descriptor in descriptors {
            let value = provided
                .remove(&descriptor.name)
                .ok_or_else(|| Error::MissingPolicyField(descriptor.name.clone()))?;

            match (&descriptor.field_type, value) {
                (FieldType::Decision, FieldValue::Decision(value)) => decision = Some(value),
                (expected, FieldValue::Re(field)) if *expected == field.field_type() => {
                    if !field.is_attached() {
                        return Err(Error::MissingData(format!("policy field {}", descriptor.name)));
                    }

                    fields.push(descriptor.clone());
                    re_values.push(field);
                }
                (expected, value) => {
                    let found = if expected.kind_name() == value.kind_name() {
                        format!("{} over a different universe", value.kind_name())
                    } else {
                        value.kind_name().to_owned()
                    };

                    return Err(Error::InvalidPolicyFieldType {
                        field: descriptor.name.clone(),
                        expected: expected.kind_name().to_owned(),
                        found,
                    });
                }
            }
        }

        let decision = decision.ok_or_else(|| Error::MissingPolicyField(decision_field.clone()))?;
        Ok(Self {
            decision_field,
            decision,
            fields,
            values: re_values,
        })
    }

    /// Returns the name of the decision field.
    #[must_use]
    pub fn decision_field(&self) -> &str {
        &self.decision_field
    }

    /// Returns the non-decision field descriptors, in declared order.
    #[must_use]
    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    #[must_use]
    pub fn decision(&self) -> Decision {
        self.decision
    }

    /// Returns the instance attached to the non-decision field `name`.
    #[must_use]
    pub fn value(&self, name: &str) -> Option<&ReField> {
        self.fields
            .iter()
            .position(|descriptor| descriptor.name == name)
            .map(|index| &self.values[index])
    }

    /// Iterates over `(name, instance)` for every non-decision field.
    pub fn re_fields(&self) -> impl Iterator<Item = (&str, &ReField)> + '_ {
        self.fields
            .iter()
            .map(|descriptor| descriptor.name.as_str())
            .zip(self.values.iter())
    }

    /// Returns true iff `other` was built from the same descriptors.
    #[must_use]
    pub fn same_shape(&self, other: &Policy) -> bool {
        self.decision_field == other.decision_field && self.fields == other.fields
    }
}

/// Returns the decision field's name after checking that names are
/// non-empty and unique, and that exactly one field is a decision.
fn validate_shape(descriptors: &[FieldDescriptor]) -> Result<String, Error> {
    let mut names = BTreeSet::new();
    let mut decisions = Vec::new();
    for descriptor in descriptors {
        if descriptor.name.is_empty() {
            return Err(Error::InvalidPolicyStructure(
                "policy field with an empty name".into(),
            ));
        }

        if !names.insert(descriptor.name.as_str()) {
            return Err(Error::InvalidPolicyStructure(format!(
                "field {} declared twice",
                descriptor.name
            )));
        }

        if descriptor.field_type == FieldType::Decision {
            decisions.push(descriptor.name.as_str());
        }
    }

    match decisions.as_slice() {
        [name] => Ok((*name).to_owned()),
        [] => Err(Error::InvalidPolicyStructure(
            "policy has no decision field".into(),
        )),
        _ => Err(Error::InvalidPolicyStructure(format!(
            "policy has more than one decision field: {:?}",
            decisions
        ))),
    }
}

#[cfg(test)]
fn shape() -> Vec<FieldDescriptor> {
    vec![
        FieldDescriptor::enumeration("action", &["GET", "PUT"]),
        FieldDescriptor::decision("decision"),
    ]
}

#[cfg(test)]
fn action(value: &str) -> FieldValue {
    let mut field = EnumRe::new(vec!["GET", "PUT"]).expect("valid enum");
    field.set_data(value);
    field.into()
}

#[test]
fn test_new() {
    let policy = Policy::new(
        &shape(),
        vec![
            ("decision", Decision::Deny.into()),
            ("action", action("GET")),
        ],
    )
    .expect("valid policy");

    assert_eq!(policy.decision_field(), "decision");
    assert_eq!(policy.decision(), Decision::Deny);
    assert_eq!(policy.fields(), &shape()[..1]);
    assert!(policy.value("action").is_some());
    assert!(policy.value("decision").is_none());
    assert_eq!(
        policy.re_fields().map(|(name, _)| name).collect::<Vec<_>>(),
        vec!["action"]
    );
}

#[test]
fn test_decision_count() {
    let none = vec![FieldDescriptor::enumeration("action", &["GET"])];
    assert!(matches!(
        Policy::new(&none, vec![("action", action("GET"))]),
        Err(Error::InvalidPolicyStructure(_))
    ));

    let two = vec![
        FieldDescriptor::decision("d1"),
        FieldDescriptor::decision("d2"),
    ];
    assert!(matches!(
        Policy::new(
            &two,
            vec![
                ("d1", FieldValue::from(Decision::Allow)),
                ("d2", Decision::Allow.into())
            ]
        ),
        Err(Error::InvalidPolicyStructure(_))
    ));
}

#[test]
fn test_missing_and_extra() {
    assert_eq!(
        Policy::new(&shape(), vec![("decision", FieldValue::from(Decision::Allow))]),
        Err(Error::MissingPolicyField("action".into()))
    );
    assert!(matches!(
        Policy::new(
            &shape(),
            vec![
                ("decision", Decision::Allow.into()),
                ("action", action("GET")),
                ("resource", action("GET")),
            ]
        ),
        Err(Error::InvalidPolicyStructure(_))
    ));
}

#[test]
fn test_field_types() {
    assert!(matches!(
        Policy::new(
            &shape(),
            vec![
                ("decision", action("GET")),
                ("action", action("GET")),
            ]
        ),
        Err(Error::InvalidPolicyFieldType { .. })
    ));

    // Same kind, different universe.
    let mut other = EnumRe::new(vec!["GET", "POST"]).expect("valid enum");
    other.set_data("GET");
    match Policy::new(
        &shape(),
        vec![
            ("decision", Decision::Allow.into()),
            ("action", FieldValue::from(other)),
        ],
    ) {
        Err(Error::InvalidPolicyFieldType { field, found, .. }) => {
            assert_eq!(field, "action");
            assert!(found.contains("different universe"));
        }
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_unattached_value() {
    let unattached = EnumRe::new(vec!["GET", "PUT"]).expect("valid enum");
    assert!(matches!(
        Policy::new(
            &shape(),
            vec![
                ("decision", Decision::Allow.into()),
                ("action", FieldValue::from(unattached)),
            ]
        ),
        Err(Error::MissingData(_))
    ));
}
