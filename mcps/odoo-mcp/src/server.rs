//! MCP Server implementation
//!
//! Binds every tool to its handler. Handler outcomes are turned into the
//! `{success, result | error}` envelope here and nowhere else.

use std::sync::Arc;

use odoo_rpc::{Gateway, Value};
use rmcp::{
    handler::server::{router::tool::ToolRouter, wrapper::Parameters},
    model::{CallToolResult, ServerCapabilities, ServerInfo},
    tool, tool_handler, tool_router, ErrorData as McpError,
};

use crate::envelope::{ToolEnvelope, ToolResult};
use crate::handlers;
use crate::params::*;

/// The main Odoo MCP Server
#[derive(Clone)]
pub struct OdooMcpServer {
    gateway: Arc<Gateway>,
    tool_router: ToolRouter<Self>,
}

fn respond(tool: &str, outcome: ToolResult<Value>) -> Result<CallToolResult, McpError> {
    ToolEnvelope::from_result(tool, outcome).into_call_result()
}

// ============================================================================
// Tool Router Implementation
// ============================================================================

#[tool_router]
impl OdooMcpServer {
    pub fn new(gateway: Arc<Gateway>) -> Self {
        Self {
            gateway,
            tool_router: Self::tool_router(),
        }
    }

    pub fn gateway(&self) -> &Gateway {
        &self.gateway
    }

    /// Names of all registered tools
    pub fn tool_names(&self) -> Vec<String> {
        self.tool_router
            .list_all()
            .into_iter()
            .map(|tool| tool.name.to_string())
            .collect()
    }

    // ========================================================================
    // Generic Tools
    // ========================================================================

    #[tool(
        description = "Execute any method on an Odoo model with positional args and keyword arguments. search/search_read default to limit 100 and search_read to a minimal field set"
    )]
    pub async fn execute_method(
        &self,
        Parameters(params): Parameters<ExecuteMethodParams>,
    ) -> Result<CallToolResult, McpError> {
        respond("execute_method", handlers::execute_method(&self.gateway, params).await)
    }

    #[tool(description = "Search records of any model with a domain; returns count and records")]
    pub async fn search_records(
        &self,
        Parameters(params): Parameters<SearchRecordsParams>,
    ) -> Result<CallToolResult, McpError> {
        respond("search_records", handlers::search_records(&self.gateway, params).await)
    }

    #[tool(description = "Count records of any model matching a domain")]
    pub async fn count_records(
        &self,
        Parameters(params): Parameters<CountRecordsParams>,
    ) -> Result<CallToolResult, McpError> {
        respond("count_records", handlers::count_records(&self.gateway, params).await)
    }

    #[tool(description = "Read records of any model by ID")]
    pub async fn read_records(
        &self,
        Parameters(params): Parameters<ReadRecordsParams>,
    ) -> Result<CallToolResult, McpError> {
        respond("read_records", handlers::read_records(&self.gateway, params).await)
    }

    #[tool(description = "Create a record of any model")]
    pub async fn create_record(
        &self,
        Parameters(params): Parameters<CreateRecordParams>,
    ) -> Result<CallToolResult, McpError> {
        respond("create_record", handlers::create_record(&self.gateway, params).await)
    }

    #[tool(description = "Update records of any model")]
    pub async fn update_records(
        &self,
        Parameters(params): Parameters<UpdateRecordsParams>,
    ) -> Result<CallToolResult, McpError> {
        respond("update_records", handlers::update_records(&self.gateway, params).await)
    }

    #[tool(description = "Delete records of any model")]
    pub async fn delete_records(
        &self,
        Parameters(params): Parameters<DeleteRecordsParams>,
    ) -> Result<CallToolResult, McpError> {
        respond("delete_records", handlers::delete_records(&self.gateway, params).await)
    }

    #[tool(description = "Search for employees by name")]
    pub async fn search_employee(
        &self,
        Parameters(params): Parameters<SearchEmployeeParams>,
    ) -> Result<CallToolResult, McpError> {
        respond("search_employee", handlers::search_employee(&self.gateway, params).await)
    }

    #[tool(description = "Search for holidays / time off within a date range")]
    pub async fn search_holidays(
        &self,
        Parameters(params): Parameters<SearchHolidaysParams>,
    ) -> Result<CallToolResult, McpError> {
        respond("search_holidays", handlers::search_holidays(&self.gateway, params).await)
    }

    // ========================================================================
    // Sales Tools
    // ========================================================================

    #[tool(description = "Search sales orders by customer, date range and state")]
    pub async fn search_sales_orders(
        &self,
        Parameters(params): Parameters<SearchSalesOrdersParams>,
    ) -> Result<CallToolResult, McpError> {
        respond(
            "search_sales_orders",
            handlers::search_sales_orders(&self.gateway, params).await,
        )
    }

    #[tool(description = "Create a sales order with order lines")]
    pub async fn create_sales_order(
        &self,
        Parameters(params): Parameters<CreateSalesOrderParams>,
    ) -> Result<CallToolResult, McpError> {
        respond(
            "create_sales_order",
            handlers::create_sales_order(&self.gateway, params).await,
        )
    }

    #[tool(
        description = "Analyze sales over a period against the previous period, optionally grouped by product, customer or salesperson"
    )]
    pub async fn analyze_sales_performance(
        &self,
        Parameters(params): Parameters<AnalyzeSalesPerformanceParams>,
    ) -> Result<CallToolResult, McpError> {
        respond(
            "analyze_sales_performance",
            handlers::analyze_sales_performance(&self.gateway, params).await,
        )
    }

    // ========================================================================
    // Purchase Tools
    // ========================================================================

    #[tool(description = "Search purchase orders by supplier, date range and state")]
    pub async fn search_purchase_orders(
        &self,
        Parameters(params): Parameters<SearchPurchaseOrdersParams>,
    ) -> Result<CallToolResult, McpError> {
        respond(
            "search_purchase_orders",
            handlers::search_purchase_orders(&self.gateway, params).await,
        )
    }

    #[tool(description = "Create a purchase order with order lines")]
    pub async fn create_purchase_order(
        &self,
        Parameters(params): Parameters<CreatePurchaseOrderParams>,
    ) -> Result<CallToolResult, McpError> {
        respond(
            "create_purchase_order",
            handlers::create_purchase_order(&self.gateway, params).await,
        )
    }

    #[tool(description = "Analyze supplier volume and on-time delivery over a period")]
    pub async fn analyze_supplier_performance(
        &self,
        Parameters(params): Parameters<AnalyzeSupplierPerformanceParams>,
    ) -> Result<CallToolResult, McpError> {
        respond(
            "analyze_supplier_performance",
            handlers::analyze_supplier_performance(&self.gateway, params).await,
        )
    }

    // ========================================================================
    // Inventory Tools
    // ========================================================================

    #[tool(description = "Check on-hand, forecast, incoming and outgoing quantities of products")]
    pub async fn check_product_availability(
        &self,
        Parameters(params): Parameters<CheckProductAvailabilityParams>,
    ) -> Result<CallToolResult, McpError> {
        respond(
            "check_product_availability",
            handlers::check_product_availability(&self.gateway, params).await,
        )
    }

    #[tool(description = "Create and apply an inventory adjustment with counted quantities")]
    pub async fn create_inventory_adjustment(
        &self,
        Parameters(params): Parameters<CreateInventoryAdjustmentParams>,
    ) -> Result<CallToolResult, McpError> {
        respond(
            "create_inventory_adjustment",
            handlers::create_inventory_adjustment(&self.gateway, params).await,
        )
    }

    #[tool(description = "Compute inventory turnover ratio and days of inventory over a period")]
    pub async fn analyze_inventory_turnover(
        &self,
        Parameters(params): Parameters<AnalyzeInventoryTurnoverParams>,
    ) -> Result<CallToolResult, McpError> {
        respond(
            "analyze_inventory_turnover",
            handlers::analyze_inventory_turnover(&self.gateway, params).await,
        )
    }

    // ========================================================================
    // Accounting Tools
    // ========================================================================

    #[tool(description = "Search journal entries with their lines")]
    pub async fn search_journal_entries(
        &self,
        Parameters(params): Parameters<SearchJournalEntriesParams>,
    ) -> Result<CallToolResult, McpError> {
        respond(
            "search_journal_entries",
            handlers::search_journal_entries(&self.gateway, params).await,
        )
    }

    #[tool(description = "Create a balanced journal entry")]
    pub async fn create_journal_entry(
        &self,
        Parameters(params): Parameters<CreateJournalEntryParams>,
    ) -> Result<CallToolResult, McpError> {
        respond(
            "create_journal_entry",
            handlers::create_journal_entry(&self.gateway, params).await,
        )
    }

    #[tool(
        description = "Compute liquidity, profitability, debt and efficiency ratios from posted entries"
    )]
    pub async fn analyze_financial_ratios(
        &self,
        Parameters(params): Parameters<AnalyzeFinancialRatiosParams>,
    ) -> Result<CallToolResult, McpError> {
        respond(
            "analyze_financial_ratios",
            handlers::analyze_financial_ratios(&self.gateway, params).await,
        )
    }

    // ========================================================================
    // Product Cost Tools
    // ========================================================================

    #[tool(description = "Analyze landed cost and profit margin of saleable products, with sorting and filtering")]
    pub async fn analyze_product_costs(
        &self,
        Parameters(params): Parameters<AnalyzeProductCostsParams>,
    ) -> Result<CallToolResult, McpError> {
        respond(
            "analyze_product_costs",
            handlers::analyze_product_costs(&self.gateway, params).await,
        )
    }

    #[tool(description = "Detailed landed-cost breakdown of one product by ID or internal reference")]
    pub async fn get_product_cost_detail(
        &self,
        Parameters(params): Parameters<GetProductCostDetailParams>,
    ) -> Result<CallToolResult, McpError> {
        respond(
            "get_product_cost_detail",
            handlers::get_product_cost_detail(&self.gateway, params).await,
        )
    }

    #[tool(description = "Compare price, cost and margin of up to 10 products by internal reference")]
    pub async fn compare_product_costs(
        &self,
        Parameters(params): Parameters<CompareProductCostsParams>,
    ) -> Result<CallToolResult, McpError> {
        respond(
            "compare_product_costs",
            handlers::compare_product_costs(&self.gateway, params).await,
        )
    }
}

// ============================================================================
// Server Handler Implementation
// ============================================================================

#[tool_handler]
impl rmcp::ServerHandler for OdooMcpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(
                "Odoo ERP server. Every tool replies {success, result} or {success, error}.\n\
                 Generic: execute_method, search_records, count_records, read_records, \
                 create_record, update_records, delete_records, search_employee, search_holidays.\n\
                 Sales: search_sales_orders, create_sales_order, analyze_sales_performance.\n\
                 Purchase: search_purchase_orders, create_purchase_order, analyze_supplier_performance.\n\
                 Inventory: check_product_availability, create_inventory_adjustment, \
                 analyze_inventory_turnover.\n\
                 Accounting: search_journal_entries, create_journal_entry, analyze_financial_ratios.\n\
                 Product cost: analyze_product_costs, get_product_cost_detail, compare_product_costs."
                    .into(),
            ),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }
}
