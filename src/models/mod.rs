pub mod loaders;
pub mod material;
pub mod question;
pub mod request;

pub use loaders::{load_material, load_materials};
pub use material::{DocumentPart, Material};
pub use question::{Answer, Question, QuestionType, RawQuestion};
pub use request::ExamGenerationRequest;
