pub type Result<T, SE> = core::result::Result<T, Error<SE>>;

#[derive(Debug, PartialEq)]
pub enum Error<SE> {
    // Storage refused to open the log file
    Open(SE),
    // Storage failed while appending text
    Write(SE),
    // Storage failed to close the log file
    Close(SE),
}
