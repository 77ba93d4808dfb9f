use async_graphql::{Context, EmptyMutation, EmptySubscription, Object, Schema};
use std::sync::Arc;

use super::rest::{validate_interval, Health};
use crate::collector::Collector;
use crate::model::{Service, Snapshot};

pub type HoststatSchema = Schema<QueryRoot, EmptyMutation, EmptySubscription>;

pub struct QueryRoot;

#[Object]
impl QueryRoot {
    async fn health(&self) -> Health {
        Health::ok()
    }

    /// Collect a fresh snapshot of this host.
    ///
    /// `interval` replaces the time since the previous sample when computing
    /// network rates.
    async fn snapshot(
        &self,
        ctx: &Context<'_>,
        interval: Option<f64>,
    ) -> async_graphql::Result<Snapshot> {
        let collector = ctx.data::<Arc<Collector>>()?;
        let interval = validate_interval(interval).map_err(async_graphql::Error::new)?;
        Ok(collector.collect_with(interval).await)
    }

    async fn services(&self, ctx: &Context<'_>) -> async_graphql::Result<Vec<Service>> {
        let collector = ctx.data::<Arc<Collector>>()?;
        Ok(collector.services().await)
    }
}

pub fn build_schema(collector: Arc<Collector>) -> HoststatSchema {
    Schema::build(QueryRoot, EmptyMutation, EmptySubscription)
        .data(collector)
        .finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::{readers_for, ReaderContext};
    use crate::mock::{MockExecutor, MockFs};
    use crate::platform::PlatformFamily;
    use crate::rates::MemoryCounterStore;
    use crate::services::Catalog;
    use std::time::Duration;

    fn schema() -> HoststatSchema {
        let ctx = ReaderContext::new(
            Arc::new(MockFs::new()),
            Arc::new(MockExecutor::new()),
            Duration::from_millis(100),
        );
        let collector = Collector::new(
            readers_for(PlatformFamily::Unknown, ctx),
            Arc::new(MemoryCounterStore::new()),
            Arc::new(Catalog::builtin().unwrap()),
            Duration::from_secs(1),
        );
        build_schema(Arc::new(collector))
    }

    #[tokio::test]
    async fn snapshot_query_resolves() {
        let resp = schema()
            .execute("{ snapshot { hostname os { family iconHint } cpu { coreCount } } }")
            .await;
        assert!(resp.errors.is_empty(), "{:?}", resp.errors);
        let data = resp.data.into_json().unwrap();
        assert_eq!(data["snapshot"]["os"]["family"], "UNKNOWN");
        assert_eq!(data["snapshot"]["os"]["iconHint"], "fa-server");
        assert_eq!(data["snapshot"]["cpu"]["coreCount"], 1);
    }

    #[tokio::test]
    async fn snapshot_query_rejects_bad_interval() {
        let resp = schema().execute("{ snapshot(interval: 0) { hostname } }").await;
        assert!(!resp.errors.is_empty());
    }

    #[tokio::test]
    async fn services_query_does_not_advance_rate_baseline() {
        let mut fs = MockFs::new();
        fs.add_file(
            "/proc/net/dev",
            "Inter-|   Receive |  Transmit\n face |bytes packets|bytes packets\n  eth0: 1000 10 0 0 0 0 0 0 2000 20 0 0 0 0 0 0\n",
        );
        let ctx = ReaderContext::new(
            Arc::new(fs),
            Arc::new(MockExecutor::new()),
            Duration::from_millis(100),
        );
        let collector = Arc::new(Collector::new(
            readers_for(PlatformFamily::Linux, ctx),
            Arc::new(MemoryCounterStore::new()),
            Arc::new(Catalog::builtin().unwrap()),
            Duration::from_secs(1),
        ));

        let resp = build_schema(collector.clone())
            .execute("{ services { displayName } }")
            .await;
        assert!(resp.errors.is_empty(), "{:?}", resp.errors);

        let snap = collector.collect().await;
        assert_eq!(snap.network.len(), 1);
        assert_eq!(snap.network[0].rx_rate_bytes_per_sec, None);
    }

    #[tokio::test]
    async fn health_query() {
        let resp = schema().execute("{ health { status } }").await;
        assert!(resp.errors.is_empty());
        assert_eq!(resp.data.into_json().unwrap()["health"]["status"], "ok");
    }
}
