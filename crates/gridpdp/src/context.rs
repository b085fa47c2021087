//! Tuple expansion.
//!
//! Every request item is split into the cartesian product of its four axes.
//! An axis with no groups contributes a single empty group, so an item
//! without contexts still yields `subjects x resources x actions` tuples.

use std::fmt::{self, Display};

use serde::Serialize;

use crate::request::{AttributeGroup, Axis, Request, RequestItem};

/// One concrete selection of a group per axis: the unit of evaluation.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RequestTuple {
    subject: AttributeGroup,
    resource: AttributeGroup,
    action: AttributeGroup,
    context: AttributeGroup,
}

impl RequestTuple {
    pub fn new(
        subject: AttributeGroup,
        resource: AttributeGroup,
        action: AttributeGroup,
        context: AttributeGroup,
    ) -> Self {
        Self {
            subject,
            resource,
            action,
            context,
        }
    }

    pub fn group(&self, axis: Axis) -> &AttributeGroup {
        match axis {
            Axis::Subject => &self.subject,
            Axis::Resource => &self.resource,
            Axis::Action => &self.action,
            Axis::Context => &self.context,
        }
    }

    pub fn subject(&self) -> &AttributeGroup {
        &self.subject
    }

    pub fn resource(&self) -> &AttributeGroup {
        &self.resource
    }

    pub fn action(&self) -> &AttributeGroup {
        &self.action
    }

    pub fn context(&self) -> &AttributeGroup {
        &self.context
    }
}

impl Display for RequestTuple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for axis in Axis::ALL {
            let group = self.group(axis);
            if group.is_empty() {
                continue;
            }
            if !first {
                f.write_str("; ")?;
            }
            first = false;
            write!(f, "{axis}: {group}")?;
        }
        if first {
            f.write_str("(empty)")?;
        }
        Ok(())
    }
}

/// Splits one item into its tuples.
///
/// Order is subject-major: the context index varies fastest.
pub fn split(item: &RequestItem) -> Vec<RequestTuple> {
    let axis = |a: Axis| -> Vec<AttributeGroup> {
        let groups = item.groups(a);
        if groups.is_empty() {
            vec![AttributeGroup::empty()]
        } else {
            groups.to_vec()
        }
    };
    let (subjects, resources, actions, contexts) = (
        axis(Axis::Subject),
        axis(Axis::Resource),
        axis(Axis::Action),
        axis(Axis::Context),
    );

    let mut tuples = Vec::with_capacity(item.tuple_count());
    for subject in &subjects {
        for resource in &resources {
            for action in &actions {
                for context in &contexts {
                    tuples.push(RequestTuple::new(
                        subject.clone(),
                        resource.clone(),
                        action.clone(),
                        context.clone(),
                    ));
                }
            }
        }
    }
    tuples
}

/// All tuples of a request, item by item.
#[derive(Debug, Clone, Default)]
pub struct EvaluationContext {
    tuples: Vec<RequestTuple>,
}

impl EvaluationContext {
    pub fn new(request: &Request) -> Self {
        let tuples = request.items().iter().flat_map(split).collect();
        Self { tuples }
    }

    pub fn tuples(&self) -> &[RequestTuple] {
        &self.tuples
    }

    pub fn len(&self) -> usize {
        self.tuples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tuples.is_empty()
    }

    pub fn into_tuples(self) -> Vec<RequestTuple> {
        self.tuples
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::Registry;
    use crate::request::RequestAttribute;

    fn group(registry: &Registry, values: &[&str]) -> Vec<RequestAttribute> {
        values
            .iter()
            .map(|v| RequestAttribute::new(registry, "id", "string", *v))
            .collect()
    }

    #[test]
    fn test_empty_item_yields_one_empty_tuple() {
        let tuples = split(&RequestItem::new());
        assert_eq!(tuples.len(), 1);
        assert!(Axis::ALL.iter().all(|a| tuples[0].group(*a).is_empty()));
    }

    #[test]
    fn test_split_order_is_subject_major() {
        let r = Registry::builtin();
        let item = RequestItem::new()
            .with_subject(group(&r, &["alice"]))
            .with_subject(group(&r, &["bob"]))
            .with_action(group(&r, &["read"]))
            .with_action(group(&r, &["write"]));

        let tuples = split(&item);
        let pairs: Vec<(&str, &str)> = tuples
            .iter()
            .map(|t| (t.subject()[0].raw_value(), t.action()[0].raw_value()))
            .collect();
        assert_eq!(
            pairs,
            vec![
                ("alice", "read"),
                ("alice", "write"),
                ("bob", "read"),
                ("bob", "write"),
            ]
        );
        assert!(tuples.iter().all(|t| t.resource().is_empty()));
    }

    #[test]
    fn test_groups_stay_intact() {
        let r = Registry::builtin();
        let item = RequestItem::new().with_subject(group(&r, &["alice", "admin"]));
        let tuples = split(&item);
        assert_eq!(tuples.len(), 1);
        assert_eq!(tuples[0].subject().len(), 2);
    }

    #[test]
    fn test_context_flattens_items() {
        let r = Registry::builtin();
        let request = Request::new()
            .with_item(RequestItem::new().with_subject(group(&r, &["a"])))
            .with_item(
                RequestItem::new()
                    .with_subject(group(&r, &["b"]))
                    .with_subject(group(&r, &["c"])),
            );
        let ctx = EvaluationContext::new(&request);
        assert_eq!(ctx.len(), 3);
        assert_eq!(ctx.len(), request.tuple_count());
    }

    #[test]
    fn test_display() {
        let r = Registry::builtin();
        let item = RequestItem::new()
            .with_subject(vec![RequestAttribute::new(&r, "dn", "x500Name", "/O=Grid/CN=Alice")])
            .with_action(vec![RequestAttribute::new(&r, "", "string", "read")]);
        let tuple = &split(&item)[0];
        assert_eq!(
            tuple.to_string(),
            "subject: dn=x500Name:/O=Grid/CN=Alice; action: string:read"
        );
        assert_eq!(RequestTuple::default().to_string(), "(empty)");
    }
}
