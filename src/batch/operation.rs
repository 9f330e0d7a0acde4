//! Operation descriptors: one ordered step of a batch.

use crate::batch::context::OperationContext;
use crate::batch::phases::InvokeStrategy;
use crate::error::Result;
use std::fmt;
use std::rc::Rc;

/// A lifecycle hook invoked with the step's mutable context
pub type Hook = Rc<dyn Fn(&mut OperationContext) -> Result<()>>;

/// One step in a batch: an action plus optional per-operation hooks
#[derive(Clone, Default)]
pub struct Operation {
    pub(crate) action: Option<Hook>,
    pub(crate) id: Option<String>,
    pub(crate) name: Option<String>,
    pub(crate) success: Option<Hook>,
    pub(crate) error: Option<Hook>,
    pub(crate) complete: Option<Hook>,
    pub(crate) ignore_errors: bool,
    /// Overrides the batch-level finish-check strategy when set
    pub(crate) invoke_strategy: Option<InvokeStrategy>,
}

impl Operation {
    pub(crate) fn with_action(action: Hook) -> Self {
        Self {
            action: Some(action),
            ..Self::default()
        }
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn ignores_errors(&self) -> bool {
        self.ignore_errors
    }
}

impl fmt::Debug for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Operation")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("has_action", &self.action.is_some())
            .field("has_success", &self.success.is_some())
            .field("has_error", &self.error.is_some())
            .field("has_complete", &self.complete.is_some())
            .field("ignore_errors", &self.ignore_errors)
            .field("invoke_strategy", &self.invoke_strategy)
            .finish()
    }
}
