//! The PDF object model: values, dictionaries, streams and identities.

mod dictionary;
#[allow(clippy::module_inception)]
mod object;
mod reference;
mod stream;
mod value;

pub use dictionary::Dictionary;
pub use object::Object;
pub use reference::ObjectRef;
pub use stream::StreamData;
pub use value::{PdfString, Value};
