pub mod dataset_assembler;
pub mod l1_processor;
pub mod matrix_reshaper;
pub mod raw_field_parser;
pub mod standards_validator;

pub use dataset_assembler::DatasetAssembler;
pub use l1_processor::{ConversionJob, ConversionSummary, L1Processor};
pub use matrix_reshaper::MatrixReshaper;
pub use raw_field_parser::{
    check_raw_fields_available, FlagValueHandler, KeepFlagValues, ParsedFieldArray, RawFieldParser,
};
pub use standards_validator::StandardsValidator;
