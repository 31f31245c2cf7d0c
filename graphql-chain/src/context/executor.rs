use tracing::debug;
use tracing::instrument;

use super::FromResponse;
use super::QueryContext;
use crate::error::Error;
use crate::json_ext::Object;

impl QueryContext {
    /// Sends the chain and decodes the value at the end of its path.
    pub async fn execute<T: FromResponse>(&self) -> Result<T, Error> {
        let data = self.send().await?;
        self.get_value(data)
    }

    /// Sends the chain for its side effects, discarding the response.
    pub async fn execute_unit(&self) -> Result<(), Error> {
        self.send().await.map(|_| ())
    }

    #[instrument(skip_all, level = "debug", fields(path = ?self.path()))]
    async fn send(&self) -> Result<Object, Error> {
        let mut context = self.clone();
        context.resolve_references().await?;

        let document = context.query()?;
        let query = document.serialize().no_indent().to_string();
        debug!(%query, "sending query");

        self.session.execute(&document).await.map_err(|error| {
            debug!(%error, "query failed");
            Error::from_session(error, &query)
        })
    }
}
