use std::collections::{BTreeSet, HashMap};

use crate::{marker::SourceIndex, scene::TargetHandle};

/// Something a pointer can "use" while hovering it.
pub trait UseActionTarget {
    /// Whether touching the object with an active beam starts its use action.
    fn activates_on_pointer_contact(&self) -> bool {
        true
    }

    fn start_using(&mut self, source: SourceIndex);

    fn stop_using(&mut self, source: SourceIndex);
}

/// Usable object that tracks which sources are currently using it.
#[derive(Clone, Debug, Default)]
pub struct UsableObject {
    pub activate_on_pointer_contact: bool,
    users: BTreeSet<SourceIndex>,
}

impl UsableObject {
    pub fn new(activate_on_pointer_contact: bool) -> Self {
        Self {
            activate_on_pointer_contact,
            users: BTreeSet::new(),
        }
    }

    pub fn is_in_use(&self) -> bool {
        !self.users.is_empty()
    }
}

impl UseActionTarget for UsableObject {
    fn activates_on_pointer_contact(&self) -> bool {
        self.activate_on_pointer_contact
    }

    fn start_using(&mut self, source: SourceIndex) {
        self.users.insert(source);
    }

    fn stop_using(&mut self, source: SourceIndex) {
        self.users.remove(&source);
    }
}

/// Use-capable scene targets, looked up by the handle a ray reports.
#[derive(Default)]
pub struct UseActionRegistry {
    targets: HashMap<TargetHandle, Box<dyn UseActionTarget>>,
}

impl UseActionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, target: TargetHandle, usable: Box<dyn UseActionTarget>) {
        self.targets.insert(target, usable);
    }

    pub fn unregister(&mut self, target: TargetHandle) -> Option<Box<dyn UseActionTarget>> {
        self.targets.remove(&target)
    }

    pub fn get(&self, target: TargetHandle) -> Option<&dyn UseActionTarget> {
        self.targets.get(&target).map(|usable| usable.as_ref())
    }

    pub fn get_mut(&mut self, target: TargetHandle) -> Option<&mut Box<dyn UseActionTarget>> {
        self.targets.get_mut(&target)
    }
}
