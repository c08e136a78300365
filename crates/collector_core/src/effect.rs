#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    StartJob {
        keywords: Vec<String>,
        output_path: String,
    },
    StopJob,
    SaveLog {
        content: String,
    },
}
