//! Single-item actions against a running endpoint.

#[cfg(test)]
mod tests {
    use ddbwire_core::{GetOptions, Path, Projection, WriteOptions};
    use ddbwire_model::{Item, ReturnValue, Value};

    use crate::{client, create_table, delete_table, test_table_name};

    fn key(id: &str) -> Item {
        Item::from([("pk".to_owned(), Value::from(id))])
    }

    #[tokio::test]
    #[ignore = "requires running DynamoDB-compatible endpoint"]
    async fn test_should_put_get_and_delete_item() -> anyhow::Result<()> {
        let client = client()?;
        let table = test_table_name("items");
        create_table(&client, &table, None).await?;

        let mut item = key("a");
        item.insert("name".to_owned(), Value::from("alice"));
        item.insert("tags".to_owned(), Value::string_set(["x"]));
        item.insert("score".to_owned(), Value::number(41.5));
        client.put_item(&table, &item, WriteOptions::default()).await?;

        let got = client.get_item(&table, &key("a"), GetOptions::default()).await?;
        assert_eq!(got.as_ref(), Some(&item));

        let projected = client
            .get_item(
                &table,
                &key("a"),
                GetOptions {
                    projection: Some(Projection::new([Path::new("name")])),
                    consistent_read: true,
                },
            )
            .await?
            .unwrap_or_default();
        assert_eq!(projected.len(), 1);
        assert_eq!(projected["name"], Value::from("alice"));

        let old = client
            .delete_item(
                &table,
                &key("a"),
                WriteOptions::default().returning(ReturnValue::AllOld),
            )
            .await?;
        assert_eq!(old, Some(item));
        assert!(
            client
                .get_item(&table, &key("a"), GetOptions::default())
                .await?
                .is_none()
        );

        delete_table(&client, &table).await;
        Ok(())
    }

    #[tokio::test]
    #[ignore = "requires running DynamoDB-compatible endpoint"]
    async fn test_should_fail_conditional_put() -> anyhow::Result<()> {
        let client = client()?;
        let table = test_table_name("cond");
        create_table(&client, &table, None).await?;

        let only_new = || WriteOptions::condition(Path::new("pk").not_exists());
        client.put_item(&table, &key("a"), only_new()).await?;
        let err = client
            .put_item(&table, &key("a"), only_new())
            .await
            .unwrap_err();
        assert!(err.is_conditional_check_failed());

        delete_table(&client, &table).await;
        Ok(())
    }

    #[tokio::test]
    #[ignore = "requires running DynamoDB-compatible endpoint"]
    async fn test_should_apply_update_clauses() -> anyhow::Result<()> {
        let client = client()?;
        let table = test_table_name("update");
        create_table(&client, &table, None).await?;

        let mut item = key("a");
        item.insert("count".to_owned(), Value::number(10.0));
        item.insert("gone".to_owned(), Value::from("bye"));
        item.insert("list".to_owned(), Value::List(vec![Value::from("a")]));
        client.put_item(&table, &item, WriteOptions::default()).await?;

        let update = Path::new("count")
            .change(-3)
            .and(Path::new("gone").remove())
            .and(Path::new("list").append(vec![Value::<f64>::from("b")]))
            .and(Path::new("fresh").set_if_not_exists(1))
            .and(Path::new("set").add(Value::<f64>::string_set(["z"])));
        let new = client
            .update_item(
                &table,
                &key("a"),
                &update,
                WriteOptions::condition(Path::new("count").gt(5)).returning(ReturnValue::AllNew),
            )
            .await?
            .unwrap_or_default();

        assert_eq!(new["count"], Value::Number(7.0));
        assert!(!new.contains_key("gone"));
        assert_eq!(
            new["list"],
            Value::List(vec![Value::from("a"), Value::from("b")])
        );
        assert_eq!(new["fresh"], Value::Number(1.0));
        assert_eq!(new["set"], Value::string_set(["z"]));

        delete_table(&client, &table).await;
        Ok(())
    }

    #[tokio::test]
    #[ignore = "requires running DynamoDB-compatible endpoint"]
    async fn test_should_report_missing_table() -> anyhow::Result<()> {
        let client = client()?;
        let err = client
            .get_item(&test_table_name("missing"), &key("a"), GetOptions::default())
            .await
            .unwrap_err();
        assert!(err.is_resource_not_found());
        Ok(())
    }
}
