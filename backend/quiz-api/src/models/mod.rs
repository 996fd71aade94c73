pub mod completion;
pub mod events;
pub mod generation;
pub mod question;
pub mod quiz;

pub use completion::{QuestionCompletedInput, QuizCompletedInput, QuizCompletionFeedback};
pub use events::{ContentChangeEvent, ContentProgressedEvent, CrudOperation, QuizUpdatedEvent};
pub use generation::{
    GenerateQuestionsRequest, GeneratedQuizEnvelope, GenerationAccepted, GenerationLimits,
    GenerationRequest, GenerationResponse, RawGeneratedEnvelope,
};
pub use question::{
    AnswerOutcome, Association, AssociationQuestion, ClozeElement, ClozeElementInput,
    ClozeElementType, ClozeQuestion, ClozeQuestionInput, ExactAnswerQuestion,
    MultipleChoiceAnswer, MultipleChoiceQuestion, NumericQuestion, Question, QuestionDraft,
    QuestionInput, QuestionPayload, QuestionType, SelfAssessmentQuestion,
};
pub use quiz::{
    AddQuestionRequest, CreateQuizRequest, PoolingMode, PoolingModeRequest, QuestionView, Quiz,
    QuizLookupRequest, QuizView, RandomSampleSizeRequest, RequiredCorrectAnswersRequest,
    SwitchQuestionsRequest, UpdateQuestionRequest,
};
