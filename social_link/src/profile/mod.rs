mod linked;
mod third_party;

pub use linked::LinkedProfile;
pub use third_party::{DISPLAY_NAME_ATTRIBUTE, PHOTO_URL_ATTRIBUTE, ThirdPartyProfile};

pub(crate) use third_party::value_to_string;
