pub mod result_record;
pub mod test_case;

pub use result_record::ResultRecord;
pub use test_case::{TestCase, load_test_cases, parse_test_cases};
