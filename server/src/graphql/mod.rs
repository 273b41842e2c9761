mod nodes;

use std::sync::Arc;

use async_graphql::{
    Context, EmptyMutation, EmptySubscription, ErrorExtensions, Object, Result, Schema,
    SimpleObject,
};
use products_hr::Hr;
use serde::Serialize;
use tracing::instrument;

use crate::errors::api_error;

use nodes::{CompensationNode, EmployeeNode, ReportingStructureNode};

pub type SchemaType = Schema<QueryRoot, EmptyMutation, EmptySubscription>;

pub fn build_schema(hr: Arc<Hr>) -> SchemaType {
    Schema::build(QueryRoot, EmptyMutation, EmptySubscription)
        .data(hr)
        .finish()
}

#[derive(Default)]
pub struct QueryRoot;

#[Object]
impl QueryRoot {
    #[instrument(name = "graphql.health", skip_all)]
    async fn health(&self) -> Result<HealthPayload> {
        Ok(HealthPayload { ok: true })
    }

    #[instrument(name = "graphql.version", skip_all)]
    async fn version(&self) -> Result<String> {
        Ok(env!("CARGO_PKG_VERSION").to_string())
    }

    #[instrument(name = "graphql.employee", skip(self, ctx))]
    async fn employee(&self, ctx: &Context<'_>, id: String) -> Result<Option<EmployeeNode>> {
        let hr = ctx.data::<Arc<Hr>>()?;
        let employee = hr
            .employees
            .get(&id)
            .await
            .map_err(|err| api_error(err).extend())?;
        Ok(employee.map(Into::into))
    }

    #[instrument(name = "graphql.reporting_structure", skip(self, ctx))]
    async fn reporting_structure(
        &self,
        ctx: &Context<'_>,
        id: String,
    ) -> Result<ReportingStructureNode> {
        let hr = ctx.data::<Arc<Hr>>()?;
        let structure = hr
            .employees
            .reporting_structure(&id)
            .await
            .map_err(|err| api_error(err).extend())?;
        Ok(structure.into())
    }

    #[instrument(name = "graphql.compensations", skip(self, ctx))]
    async fn compensations(
        &self,
        ctx: &Context<'_>,
        employee_id: String,
    ) -> Result<Vec<CompensationNode>> {
        let hr = ctx.data::<Arc<Hr>>()?;
        let compensations = hr
            .compensations
            .for_employee(&employee_id)
            .await
            .map_err(|err| api_error(err).extend())?;
        Ok(compensations.into_iter().map(Into::into).collect())
    }
}

#[derive(Clone, Debug, SimpleObject, Serialize)]
pub struct HealthPayload {
    pub ok: bool,
}
