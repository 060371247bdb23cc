use kernel::interface::database::Transaction;
use kernel::KernelError;

/// Commits `con` when `outcome` succeeded and rolls it back otherwise, so the writes of a
/// failed operation never become visible.
pub(crate) async fn settle<T, Tx>(
    con: Tx,
    outcome: error_stack::Result<T, KernelError>,
) -> error_stack::Result<T, KernelError>
where
    T: Send,
    Tx: Transaction,
{
    match outcome {
        Ok(value) => {
            con.commit().await?;
            Ok(value)
        }
        Err(mut report) => {
            if let Err(rollback) = con.roll_back().await {
                report.extend_one(rollback);
            }
            Err(report)
        }
    }
}
