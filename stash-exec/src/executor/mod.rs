pub mod concurrency;
pub mod events;
pub mod http;
pub mod request;
pub mod response;
mod result;
mod scheduler;
mod sequence;
mod step_runner;
mod types;
pub mod worker;

pub use events::{CompositeEventSink, Event, EventSink, NoOpEventSink, StdoutEventSink};
pub use http::{HttpClient, HttpError, HttpRequestParts, HttpResponseParts, ReqwestHttpClient};
pub use result::{ExecError, RunError, RunSummary, SequenceSummary};
pub use scheduler::{Executor, PreparedRun};
pub use step_runner::{run_request, JitterSource, RequestContext, RequestDeps};
pub use types::RunnerConfig;
pub use worker::{RequestOutcome, RequestReport, ResponseBody, NO_STATUS};
