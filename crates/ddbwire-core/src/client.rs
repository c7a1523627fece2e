//! The DynamoDB client.
//!
//! Every action goes through the same pipeline: serialize the input, resolve
//! credentials, sign, send, and classify the response, with the whole attempt
//! wrapped in [`retry`]. The item and read actions add expression compilation
//! and value encoding around that.

use std::sync::Arc;

use bytes::Bytes;
use chrono::Utc;
use ddbwire_auth::{CachedCredentials, ChainCredentials, CredentialSource, sign};
use ddbwire_http::{HttpClient, ReqwestHttpClient};
use ddbwire_model::input::{
    DeleteItemInput, GetItemInput, PutItemInput, QueryInput, ScanInput, UpdateItemInput,
};
use ddbwire_model::output::{
    DeleteItemOutput, GetItemOutput, PageOutput, PutItemOutput, UpdateItemOutput,
};
use ddbwire_model::{
    AttributeMap, Item, NumberParser, Numeric, Operation, Select, ServiceError, decode_item,
    encode_item, parse_f64,
};
use futures::{Stream, StreamExt};
use http::header::CONTENT_TYPE;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::config::ClientConfig;
use crate::error::Error;
use crate::expression::{
    ExpressionError, HashKey, Placeholders, UpdateExpr, compile_condition, compile_key_condition,
    compile_projection, compile_update,
};
use crate::options::{GetOptions, Page, QueryOptions, ScanOptions, WriteOptions};
use crate::paginate::{count_pages, paginate};
use crate::retry::retry;

/// Service name in the signing scope.
pub const SERVICE: &str = "dynamodb";

/// Content type of every request body.
pub const CONTENT_TYPE_JSON: &str = "application/x-amz-json-1.0";

const X_AMZ_TARGET: &str = "x-amz-target";

/// A DynamoDB client, generic over the number type items are decoded with.
pub struct Client<N = f64> {
    http: Arc<dyn HttpClient>,
    credentials: Arc<CachedCredentials<Arc<dyn CredentialSource>>>,
    config: ClientConfig,
    endpoint: http::Uri,
    parse: NumberParser<N>,
}

impl<N> Clone for Client<N> {
    fn clone(&self) -> Self {
        Self {
            http: Arc::clone(&self.http),
            credentials: Arc::clone(&self.credentials),
            config: self.config.clone(),
            endpoint: self.endpoint.clone(),
            parse: self.parse,
        }
    }
}

impl<N> std::fmt::Debug for Client<N> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("http", &self.http)
            .field("credentials", &self.credentials)
            .field("config", &self.config)
            .field("endpoint", &self.endpoint)
            .finish_non_exhaustive()
    }
}

impl Client<f64> {
    /// Client decoding numbers as `f64`. Keys from `credentials` are cached by
    /// the client until they expire or the service reports them expired.
    pub fn new(
        http: impl HttpClient + 'static,
        credentials: impl CredentialSource + 'static,
        config: ClientConfig,
    ) -> Result<Self, Error> {
        Self::with_parser(http, credentials, config, parse_f64)
    }

    /// Client over `reqwest` with configuration and credentials from the
    /// environment.
    pub fn from_env() -> Result<Self, Error> {
        Self::new(
            ReqwestHttpClient::new(),
            ChainCredentials::from_env(),
            ClientConfig::from_env(),
        )
    }
}

impl<N: Numeric> Client<N> {
    /// Client decoding numbers with `parse`.
    pub fn with_parser(
        http: impl HttpClient + 'static,
        credentials: impl CredentialSource + 'static,
        config: ClientConfig,
        parse: NumberParser<N>,
    ) -> Result<Self, Error> {
        let endpoint: http::Uri = config
            .endpoint_url()
            .parse()
            .map_err(|e: http::uri::InvalidUri| Error::Request(e.to_string()))?;
        let source: Arc<dyn CredentialSource> = Arc::new(credentials);
        Ok(Self {
            http: Arc::new(http),
            credentials: Arc::new(CachedCredentials::new(source)),
            config,
            endpoint,
            parse,
        })
    }

    /// The same client, decoding numbers with `parse` instead.
    #[must_use]
    pub fn with_number_parser<M: Numeric>(self, parse: NumberParser<M>) -> Client<M> {
        Client {
            http: self.http,
            credentials: self.credentials,
            config: self.config,
            endpoint: self.endpoint,
            parse,
        }
    }

    /// Active configuration.
    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Send any action with a serializable input and decode its output.
    pub async fn send_request<I, O>(&self, operation: Operation, input: &I) -> Result<O, Error>
    where
        I: Serialize + ?Sized,
        O: DeserializeOwned,
    {
        let body = to_body(input)?;
        self.execute(operation, body).await
    }

    async fn execute<O: DeserializeOwned>(
        &self,
        operation: Operation,
        body: Bytes,
    ) -> Result<O, Error> {
        let response = retry(&self.config.retry, |attempt| {
            self.attempt(operation, body.clone(), attempt)
        })
        .await?;
        Ok(serde_json::from_slice(&response)?)
    }

    async fn attempt(&self, operation: Operation, body: Bytes, attempt: u32) -> Result<Bytes, Error> {
        let credentials = self
            .credentials
            .get_key()
            .await?
            .ok_or(Error::NoCredentials)?;

        let request = http::Request::builder()
            .method(http::Method::POST)
            .uri(self.endpoint.clone())
            .header(CONTENT_TYPE, CONTENT_TYPE_JSON)
            .header(X_AMZ_TARGET, operation.target())
            .body(body)
            .map_err(|e| Error::Request(e.to_string()))?;
        let request = sign(request, &credentials, &self.config.region, SERVICE, Utc::now())?;

        debug!(operation = %operation, attempt, "sending request");
        let response = self.http.send(request).await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response.into_body());
        }

        let err = ServiceError::from_response(status, response.body());
        debug!(operation = %operation, attempt, code = %err.code, "service error");
        if err.is_expired_token() {
            self.credentials.invalidate();
        }
        Err(err.into())
    }

    fn decode(&self, item: AttributeMap) -> Result<Item<N>, Error> {
        Ok(decode_item(item, &self.parse)?)
    }

    fn decode_returned(&self, attributes: AttributeMap) -> Result<Option<Item<N>>, Error> {
        if attributes.is_empty() {
            return Ok(None);
        }
        self.decode(attributes).map(Some)
    }

    /// Read one item by primary key. `None` if no item has the key.
    pub async fn get_item(
        &self,
        table: &str,
        key: &Item<N>,
        options: GetOptions,
    ) -> Result<Option<Item<N>>, Error> {
        let mut placeholders = Placeholders::new();
        let projection_expression = options
            .projection
            .as_ref()
            .and_then(|p| compile_projection(p, &mut placeholders));
        let (names, _) = placeholders.into_parts();

        let input = GetItemInput {
            table_name: table.to_owned(),
            key: encode_non_empty(key)?,
            consistent_read: options.consistent_read.then_some(true),
            projection_expression,
            expression_attribute_names: names,
        };
        let output: GetItemOutput = self.send_request(Operation::GetItem, &input).await?;
        output.item.map(|item| self.decode(item)).transpose()
    }

    /// Create or replace an item.
    pub async fn put_item(
        &self,
        table: &str,
        item: &Item<N>,
        options: WriteOptions,
    ) -> Result<Option<Item<N>>, Error> {
        let mut placeholders = Placeholders::new();
        let condition_expression = options
            .condition
            .as_ref()
            .map(|c| compile_condition(c, &mut placeholders))
            .transpose()?;
        let (names, values) = placeholders.into_parts();

        let input = PutItemInput {
            table_name: table.to_owned(),
            item: encode_non_empty(item)?,
            condition_expression,
            expression_attribute_names: names,
            expression_attribute_values: values,
            return_values: Some(options.return_values),
        };
        let output: PutItemOutput = self.send_request(Operation::PutItem, &input).await?;
        self.decode_returned(output.attributes)
    }

    /// Apply `update` to the item with `key`. An update without clauses is
    /// rejected before anything is sent.
    pub async fn update_item(
        &self,
        table: &str,
        key: &Item<N>,
        update: &UpdateExpr,
        options: WriteOptions,
    ) -> Result<Option<Item<N>>, Error> {
        let mut placeholders = Placeholders::new();
        let update_expression =
            compile_update(update, &mut placeholders).ok_or(ExpressionError::EmptyUpdate)?;
        let condition_expression = options
            .condition
            .as_ref()
            .map(|c| compile_condition(c, &mut placeholders))
            .transpose()?;
        let (names, values) = placeholders.into_parts();

        let input = UpdateItemInput {
            table_name: table.to_owned(),
            key: encode_non_empty(key)?,
            update_expression: Some(update_expression),
            condition_expression,
            expression_attribute_names: names,
            expression_attribute_values: values,
            return_values: Some(options.return_values),
        };
        let output: UpdateItemOutput = self.send_request(Operation::UpdateItem, &input).await?;
        self.decode_returned(output.attributes)
    }

    /// Delete the item with `key`.
    pub async fn delete_item(
        &self,
        table: &str,
        key: &Item<N>,
        options: WriteOptions,
    ) -> Result<Option<Item<N>>, Error> {
        let mut placeholders = Placeholders::new();
        let condition_expression = options
            .condition
            .as_ref()
            .map(|c| compile_condition(c, &mut placeholders))
            .transpose()?;
        let (names, values) = placeholders.into_parts();

        let input = DeleteItemInput {
            table_name: table.to_owned(),
            key: encode_non_empty(key)?,
            condition_expression,
            expression_attribute_names: names,
            expression_attribute_values: values,
            return_values: Some(options.return_values),
        };
        let output: DeleteItemOutput = self.send_request(Operation::DeleteItem, &input).await?;
        self.decode_returned(output.attributes)
    }

    fn query_input(
        table: &str,
        key_condition: &HashKey,
        options: &QueryOptions,
    ) -> Result<QueryInput, Error> {
        let mut placeholders = Placeholders::new();
        let key_condition_expression = compile_key_condition(key_condition, &mut placeholders)?;
        let filter_expression = options
            .filter
            .as_ref()
            .map(|c| compile_condition(c, &mut placeholders))
            .transpose()?;
        let projection_expression = options
            .projection
            .as_ref()
            .and_then(|p| compile_projection(p, &mut placeholders));
        let (names, values) = placeholders.into_parts();

        Ok(QueryInput {
            table_name: table.to_owned(),
            index_name: options.index.clone(),
            key_condition_expression: Some(key_condition_expression),
            filter_expression,
            projection_expression,
            expression_attribute_names: names,
            expression_attribute_values: values,
            scan_index_forward: (!options.scan_forward).then_some(false),
            limit: None,
            exclusive_start_key: AttributeMap::new(),
            select: None,
            consistent_read: options.consistent_read.then_some(true),
        })
    }

    fn scan_input(table: &str, options: &ScanOptions) -> Result<ScanInput, Error> {
        let mut placeholders = Placeholders::new();
        let filter_expression = options
            .filter
            .as_ref()
            .map(|c| compile_condition(c, &mut placeholders))
            .transpose()?;
        let projection_expression = options
            .projection
            .as_ref()
            .and_then(|p| compile_projection(p, &mut placeholders));
        let (names, values) = placeholders.into_parts();

        Ok(ScanInput {
            table_name: table.to_owned(),
            index_name: options.index.clone(),
            filter_expression,
            projection_expression,
            expression_attribute_names: names,
            expression_attribute_values: values,
            limit: None,
            exclusive_start_key: AttributeMap::new(),
            segment: options.segment.map(|(segment, _)| segment),
            total_segments: options.segment.map(|(_, total)| total),
            select: None,
            consistent_read: options.consistent_read.then_some(true),
        })
    }

    /// Every item matching `key_condition`, fetched page by page as the stream
    /// is consumed. Expressions are compiled up front, so an invalid one fails
    /// here rather than on the first poll.
    pub fn query<'a>(
        &'a self,
        table: &str,
        key_condition: &HashKey,
        options: QueryOptions,
    ) -> Result<impl Stream<Item = Result<Item<N>, Error>> + use<'a, N>, Error> {
        let base = Self::query_input(table, key_condition, &options)?;
        let fetch = move |cursor: Option<AttributeMap>, limit: Option<u32>| {
            let mut input = base.clone();
            input.exclusive_start_key = cursor.unwrap_or_default();
            input.limit = limit;
            async move {
                self.send_request::<_, PageOutput>(Operation::Query, &input)
                    .await
            }
        };
        Ok(self.decode_stream(paginate(fetch, options.start_key, options.limit)))
    }

    /// Every item in the table or index, fetched page by page as the stream is
    /// consumed.
    pub fn scan<'a>(
        &'a self,
        table: &str,
        options: ScanOptions,
    ) -> Result<impl Stream<Item = Result<Item<N>, Error>> + use<'a, N>, Error> {
        let base = Self::scan_input(table, &options)?;
        let fetch = move |cursor: Option<AttributeMap>, limit: Option<u32>| {
            let mut input = base.clone();
            input.exclusive_start_key = cursor.unwrap_or_default();
            input.limit = limit;
            async move {
                self.send_request::<_, PageOutput>(Operation::Scan, &input)
                    .await
            }
        };
        Ok(self.decode_stream(paginate(fetch, options.start_key, options.limit)))
    }

    fn decode_stream<S>(&self, items: S) -> impl Stream<Item = Result<Item<N>, Error>> + use<S, N>
    where
        S: Stream<Item = Result<AttributeMap, Error>>,
    {
        let parse = self.parse;
        items.map(
            move |item: Result<AttributeMap, Error>| -> Result<Item<N>, Error> {
                Ok(decode_item(item?, &parse)?)
            },
        )
    }

    /// A single query page. `limit` is the page size and `start_key` the cursor.
    ///
    /// A zero `limit` sends nothing and returns an empty page whose cursor is
    /// `start_key`.
    pub async fn query_single_page(
        &self,
        table: &str,
        key_condition: &HashKey,
        options: QueryOptions,
    ) -> Result<Page<Item<N>>, Error> {
        if options.limit == Some(0) {
            return Ok(Page::empty(options.start_key));
        }
        let mut input = Self::query_input(table, key_condition, &options)?;
        input.limit = options.limit.map(page_size);
        input.exclusive_start_key = options.start_key.unwrap_or_default();
        let page: PageOutput = self.send_request(Operation::Query, &input).await?;
        self.decode_page(page)
    }

    /// A single scan page. `limit` is the page size and `start_key` the cursor.
    /// A zero `limit` behaves as in [`Client::query_single_page`].
    pub async fn scan_single_page(
        &self,
        table: &str,
        options: ScanOptions,
    ) -> Result<Page<Item<N>>, Error> {
        if options.limit == Some(0) {
            return Ok(Page::empty(options.start_key));
        }
        let mut input = Self::scan_input(table, &options)?;
        input.limit = options.limit.map(page_size);
        input.exclusive_start_key = options.start_key.unwrap_or_default();
        let page: PageOutput = self.send_request(Operation::Scan, &input).await?;
        self.decode_page(page)
    }

    fn decode_page(&self, page: PageOutput) -> Result<Page<Item<N>>, Error> {
        let items = page
            .items
            .into_iter()
            .map(|item| self.decode(item))
            .collect::<Result<_, _>>()?;
        let last_evaluated_key =
            (!page.last_evaluated_key.is_empty()).then_some(page.last_evaluated_key);
        Ok(Page {
            items,
            last_evaluated_key,
        })
    }

    /// Number of items matching `key_condition` (and the filter, if any),
    /// summed over all pages with `Select=COUNT`.
    ///
    /// `projection` and `limit` are ignored: a count returns no attributes and
    /// always covers every page.
    pub async fn count(
        &self,
        table: &str,
        key_condition: &HashKey,
        options: QueryOptions,
    ) -> Result<u64, Error> {
        let options = QueryOptions {
            projection: None,
            ..options
        };
        let mut base = Self::query_input(table, key_condition, &options)?;
        base.select = Some(Select::Count);
        count_pages(
            move |cursor| {
                let mut input = base.clone();
                input.exclusive_start_key = cursor.unwrap_or_default();
                async move {
                    self.send_request::<_, PageOutput>(Operation::Query, &input)
                        .await
                }
            },
            options.start_key,
        )
        .await
    }

    /// Number of items in the table or index (matching the filter, if any).
    ///
    /// `projection` and `limit` are ignored, as for [`Client::count`].
    pub async fn scan_count(&self, table: &str, options: ScanOptions) -> Result<u64, Error> {
        let options = ScanOptions {
            projection: None,
            ..options
        };
        let mut base = Self::scan_input(table, &options)?;
        base.select = Some(Select::Count);
        count_pages(
            move |cursor| {
                let mut input = base.clone();
                input.exclusive_start_key = cursor.unwrap_or_default();
                async move {
                    self.send_request::<_, PageOutput>(Operation::Scan, &input)
                        .await
                }
            },
            options.start_key,
        )
        .await
    }
}

fn to_body<I: Serialize + ?Sized>(input: &I) -> Result<Bytes, Error> {
    serde_json::to_vec(input)
        .map(Bytes::from)
        .map_err(|e| Error::Request(e.to_string()))
}

fn encode_non_empty<N: Numeric>(item: &Item<N>) -> Result<AttributeMap, Error> {
    if item.is_empty() {
        return Err(Error::EmptyItem);
    }
    Ok(encode_item(item))
}

fn page_size(limit: u64) -> u32 {
    u32::try_from(limit).unwrap_or(u32::MAX)
}
