//! Order sub-operations of the catalog client.
//!
//! Orders are read-mostly from the PIM side: the tool lists recent orders,
//! flips fulfilment status, and attaches notes. Nothing here participates in
//! product reconciliation.

use reqwest::Method;

use crate::error::CatalogError;
use crate::types::{RemoteOrder, RemoteOrderNote};
use crate::CatalogClient;

impl CatalogClient {
    /// Lists one page of orders, optionally filtered by status.
    ///
    /// # Errors
    ///
    /// Propagates request errors.
    pub async fn list_orders(
        &self,
        page: usize,
        status: Option<&str>,
    ) -> Result<Vec<RemoteOrder>, CatalogError> {
        let mut query = vec![
            ("page", page.to_string()),
            ("per_page", self.page_size().to_string()),
        ];
        if let Some(status) = status {
            query.push(("status", status.to_owned()));
        }
        self.request(Method::GET, "orders", &query, None::<&()>)
            .await
    }

    /// Fetches a single order by remote id.
    ///
    /// # Errors
    ///
    /// [`CatalogError::NotFound`] when the id does not exist; otherwise
    /// propagates request errors.
    pub async fn get_order(&self, id: i64) -> Result<RemoteOrder, CatalogError> {
        self.request(Method::GET, &format!("orders/{id}"), &[], None::<&()>)
            .await
    }

    /// Updates an order's status (e.g. `"completed"`).
    ///
    /// # Errors
    ///
    /// Propagates request errors.
    pub async fn update_order_status(
        &self,
        id: i64,
        status: &str,
    ) -> Result<RemoteOrder, CatalogError> {
        self.request(
            Method::PUT,
            &format!("orders/{id}"),
            &[],
            Some(&serde_json::json!({ "status": status })),
        )
        .await
    }

    /// Attaches a note to an order. `customer_note` controls whether the
    /// storefront shows it to the buyer.
    ///
    /// # Errors
    ///
    /// Propagates request errors.
    pub async fn add_order_note(
        &self,
        id: i64,
        note: &str,
        customer_note: bool,
    ) -> Result<RemoteOrderNote, CatalogError> {
        self.request(
            Method::POST,
            &format!("orders/{id}/notes"),
            &[],
            Some(&serde_json::json!({ "note": note, "customer_note": customer_note })),
        )
        .await
    }
}
