//! Paginated reads against a running endpoint.

#[cfg(test)]
mod tests {
    use ddbwire_core::{HashKey, Path, QueryOptions, RangeKey, ScanOptions, WriteOptions};
    use ddbwire_model::{Item, Value};
    use futures::TryStreamExt;

    use crate::{client, create_table, delete_table, test_table_name};

    async fn seed(client: &ddbwire_core::Client, table: &str, count: usize) -> anyhow::Result<()> {
        for i in 0..count {
            let item = Item::from([
                ("pk".to_owned(), Value::from("user")),
                ("sk".to_owned(), Value::from(format!("order#{i:03}"))),
                ("n".to_owned(), Value::number(f64::from(u32::try_from(i)?))),
            ]);
            client.put_item(table, &item, WriteOptions::default()).await?;
        }
        Ok(())
    }

    #[tokio::test]
    #[ignore = "requires running DynamoDB-compatible endpoint"]
    async fn test_should_query_across_pages_in_order() -> anyhow::Result<()> {
        let client = client()?;
        let table = test_table_name("query");
        create_table(&client, &table, Some("sk")).await?;
        seed(&client, &table, 12).await?;

        let key_condition = HashKey::new("pk", "user").and(RangeKey::new("sk").begins_with("order#"));

        // Single pages of five force the cursor through three pages.
        let mut start_key = None;
        let mut paged = Vec::new();
        loop {
            let page = client
                .query_single_page(
                    &table,
                    &key_condition,
                    QueryOptions {
                        limit: Some(5),
                        start_key: start_key.take(),
                        ..QueryOptions::default()
                    },
                )
                .await?;
            paged.extend(page.items);
            match page.last_evaluated_key {
                Some(next) => start_key = Some(next),
                None => break,
            }
        }
        assert_eq!(paged.len(), 12);

        let streamed: Vec<_> = client
            .query(&table, &key_condition, QueryOptions::default())?
            .try_collect()
            .await?;
        assert_eq!(streamed, paged);
        assert_eq!(streamed[0]["sk"], Value::from("order#000"));

        let descending: Vec<_> = client
            .query(
                &table,
                &key_condition,
                QueryOptions {
                    scan_forward: false,
                    limit: Some(3),
                    ..QueryOptions::default()
                },
            )?
            .try_collect()
            .await?;
        assert_eq!(descending.len(), 3);
        assert_eq!(descending[0]["sk"], Value::from("order#011"));

        delete_table(&client, &table).await;
        Ok(())
    }

    #[tokio::test]
    #[ignore = "requires running DynamoDB-compatible endpoint"]
    async fn test_should_scan_with_filter_and_count() -> anyhow::Result<()> {
        let client = client()?;
        let table = test_table_name("scan");
        create_table(&client, &table, Some("sk")).await?;
        seed(&client, &table, 10).await?;

        let options = ScanOptions {
            filter: Some(Path::new("n").gte(5)),
            ..ScanOptions::default()
        };
        let items: Vec<_> = client.scan(&table, options.clone())?.try_collect().await?;
        assert_eq!(items.len(), 5);
        assert_eq!(client.scan_count(&table, options).await?, 5);

        let total = client
            .count(&table, &HashKey::new("pk", "user"), QueryOptions::default())
            .await?;
        assert_eq!(total, 10);

        delete_table(&client, &table).await;
        Ok(())
    }
}
