pub mod dialog;
pub mod dialog_builder;
pub mod extraction;
pub mod form_flow;
pub mod form_schema;
pub mod form_values;
pub mod pricing;
pub mod time_span;

pub use dialog::{Button, Card, OnClick, Reply, Section, Widget};
pub use extraction::ExtractionPipeline;
pub use form_flow::MultiStepForm;
pub use form_schema::{FormVariant, StepId};
pub use form_values::{
    Conversation, EventKind, FormInput, FormInputs, Interaction, ParameterBag, Requester,
    ValueExtractor,
};
