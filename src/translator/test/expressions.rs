macro_rules! test_translate_filter {
    ($func_name:ident, expected = $expected:expr, query = $query:expr, $(options = $options:expr,)?) => {
        #[test]
        fn $func_name() {
            #[allow(unused_imports)]
            use crate::{
                map,
                options::{FieldType, TranslateOptions},
                parser,
                translator::Translator,
            };

            #[allow(unused_mut, unused_assignments)]
            let mut options = TranslateOptions::default();
            $(options = $options;)?
            let statement = parser::parse_statement($query).expect("query should parse");
            let expected = $expected;
            let actual = Translator::new(&options)
                .translate(&statement)
                .map(|plan| plan.filter);
            assert_eq!(expected, actual);
        }
    };
}

mod comparisons {
    use bson::doc;

    test_translate_filter!(
        eq_long,
        expected = Ok(doc! { "value": 1_i64 }),
        query = "select * from my_table where value=1",
    );

    test_translate_filter!(
        eq_negative_long,
        expected = Ok(doc! { "value": -1057614563_i64 }),
        query = "select * from my_table where value=-1057614563",
    );

    test_translate_filter!(
        eq_double_quoted_string,
        expected = Ok(doc! { "value": "theValue" }),
        query = "select * from my_table where value=\"theValue\"",
    );

    test_translate_filter!(
        eq_single_quoted_string,
        expected = Ok(doc! { "value2": "theValue" }),
        query = "select * from my_table where value2='theValue'",
    );

    test_translate_filter!(
        unicode_passes_through,
        expected = Ok(doc! { "value2": "亀a亁b亂c亃d亄" }),
        query = "select * from my_table where value2=\"亀a亁b亂c亃d亄\"",
    );

    test_translate_filter!(
        not_equals,
        expected = Ok(doc! { "value": { "$ne": 1_i64 } }),
        query = "select * from my_table where value!=1",
    );

    test_translate_filter!(
        greater_than,
        expected = Ok(doc! { "value": { "$gt": 1_i64 } }),
        query = "select * from my_table where value > 1",
    );

    test_translate_filter!(
        less_than,
        expected = Ok(doc! { "value": { "$lt": 1_i64 } }),
        query = "select * from my_table where value < 1",
    );

    test_translate_filter!(
        greater_than_equals,
        expected = Ok(doc! { "value": { "$gte": 1_i64 } }),
        query = "select * from my_table where value >= 1",
    );

    test_translate_filter!(
        less_than_equals,
        expected = Ok(doc! { "value": { "$lte": 1_i64 } }),
        query = "select * from my_table where value <= 1",
    );

    test_translate_filter!(
        deep_nested_column,
        expected = Ok(doc! { "a.b.c.d.e.key": "value" }),
        query = "select * from my_table where a.b.c.d.e.key = \"value\"",
    );

    test_translate_filter!(
        two_columns_compare_as_expr,
        expected = Ok(doc! { "$expr": { "$eq": ["col1", "col2"] } }),
        query = "select * from my_table where col1 = col2",
    );
}

mod field_types {
    use bson::doc;

    test_translate_filter!(
        string_override_unquotes_number,
        expected = Ok(doc! { "value": "1" }),
        query = "select * from my_table where value=1",
        options = TranslateOptions::default().with_field_type("value", FieldType::String),
    );

    test_translate_filter!(
        number_override_coerces_quoted,
        expected = Ok(doc! { "value": 1_i64 }),
        query = "select * from my_table where value=\"1\"",
        options = TranslateOptions::default().with_field_type("value", FieldType::Number),
    );

    test_translate_filter!(
        number_override_coerces_quoted_gt,
        expected = Ok(doc! { "value": { "$gt": 1_i64 } }),
        query = "select * from my_table where value > \"1\"",
        options = TranslateOptions::default().with_field_type("value", FieldType::Number),
    );

    test_translate_filter!(
        date_override_plain_format,
        expected = Ok(doc! { "value": { "$gt": bson::DateTime::from_millis(1354320000000) } }),
        query = "select * from my_table where value > \"2012-12-01\"",
        options = TranslateOptions::default().with_field_type("value", FieldType::Date),
    );

    test_translate_filter!(
        date_override_iso8601,
        expected = Ok(doc! { "value": { "$gt": bson::DateTime::from_millis(1373653861000) } }),
        query = "select * from my_table where value > \"2013-07-12T18:31:01.000Z\"",
        options = TranslateOptions::default().with_field_type("value", FieldType::Date),
    );

    test_translate_filter!(
        date_override_unparseable,
        expected = Err(crate::translator::Error::BadDate("who cares".to_string())),
        query = "select * from my_table where value > \"who cares\"",
        options = TranslateOptions::default().with_field_type("value", FieldType::Date),
    );

    test_translate_filter!(
        default_field_type_applies,
        expected = Ok(doc! { "key": "0" }),
        query = "select * from my_table where key = 0",
        options = TranslateOptions::default().with_default_field_type(FieldType::String),
    );

    test_translate_filter!(
        mapping_beats_default,
        expected = Ok(doc! { "key": "0" }),
        query = "select * from my_table where key = 0",
        options = TranslateOptions::default()
            .with_default_field_type(FieldType::Number)
            .with_field_type("key", FieldType::String),
    );

    test_translate_filter!(
        boolean_override,
        expected = Ok(doc! { "flag": true }),
        query = "select * from my_table where flag = \"TRUE\"",
        options = TranslateOptions::default().with_field_type("flag", FieldType::Boolean),
    );
}

mod booleans {
    use bson::doc;

    test_translate_filter!(
        bare_boolean_column,
        expected = Ok(doc! { "booleanField": true }),
        query = "select * from my_table where booleanField",
    );

    test_translate_filter!(
        not_boolean_column,
        expected = Ok(doc! { "booleanField": { "$ne": true } }),
        query = "select * from my_table where NOT booleanField",
    );

    test_translate_filter!(
        boolean_equals_true,
        expected = Ok(doc! { "booleanField": true }),
        query = "select * from my_table where booleanField = true",
    );

    test_translate_filter!(
        boolean_not_equals_true,
        expected = Ok(doc! { "booleanField": { "$ne": true } }),
        query = "select * from my_table where booleanField != true",
    );

    test_translate_filter!(
        boolean_equals_false,
        expected = Ok(doc! { "booleanField": false }),
        query = "select * from my_table where booleanField = false",
    );

    test_translate_filter!(
        boolean_not_equals_false,
        expected = Ok(doc! { "booleanField": { "$ne": false } }),
        query = "select * from my_table where booleanField != false",
    );
}

mod null_checks {
    use bson::doc;

    test_translate_filter!(
        is_null,
        expected = Ok(doc! { "value": { "$exists": false } }),
        query = "select * from my_table where value IS NULL",
    );

    test_translate_filter!(
        is_not_null,
        expected = Ok(doc! { "value": { "$exists": true } }),
        query = "select * from my_table where value IS NOT NULL",
    );

    test_translate_filter!(
        quoted_column_is_null,
        expected = Ok(doc! { "foo": { "$exists": false } }),
        query = "select * from my_table where \"foo\" IS NULL",
    );
}

mod like {
    use bson::doc;
    use crate::translator::Error;

    test_translate_filter!(
        trailing_wildcard,
        expected = Ok(doc! { "subDocument.value": { "$regex": "^start.*$" } }),
        query = "select * from my_table where subDocument.value LIKE 'start%'",
    );

    test_translate_filter!(
        wildcards_both_sides,
        expected = Ok(doc! { "subDocument.value": { "$regex": "^.*start.*$" } }),
        query = "select * from my_table where subDocument.value LIKE '%start%'",
    );

    test_translate_filter!(
        single_char_wildcard,
        expected = Ok(doc! { "subDocument.value": { "$regex": "^start.{1}$" } }),
        query = "select * from my_table where subDocument.value LIKE 'start_'",
    );

    test_translate_filter!(
        mixed_wildcards,
        expected = Ok(doc! { "subDocument.value": { "$regex": "^.{1}st.{1}rt.*$" } }),
        query = "select * from my_table where subDocument.value LIKE '_st_rt%'",
    );

    test_translate_filter!(
        character_classes,
        expected = Ok(
            doc! { "subDocument.value": { "$regex": "^st[dz]{1}rt[a-d]{1}time.*$" } }
        ),
        query = "select * from my_table where subDocument.value LIKE 'st[dz]rt[a-d]time%'",
    );

    test_translate_filter!(
        double_quoted_pattern,
        expected = Ok(doc! { "_id": { "$regex": "^PREFIX.*$" } }),
        query = "select * from my_table where _id LIKE \"PREFIX%\"",
    );

    test_translate_filter!(
        not_like_is_rejected,
        expected = Err(Error::UnsupportedLike),
        query = "select * from my_table where value NOT LIKE 'start%'",
    );
}

mod in_lists {
    use bson::doc;

    test_translate_filter!(
        in_strings,
        expected = Ok(doc! { "value": { "$in": ["theValue1", "theValue2", "theValue3"] } }),
        query = "select column1 from my_table where value IN (\"theValue1\",\"theValue2\",\"theValue3\")",
    );

    test_translate_filter!(
        not_in_strings,
        expected = Ok(doc! { "value": { "$nin": ["theValue1", "theValue2", "theValue3"] } }),
        query = "select column1 from my_table where value NOT IN (\"theValue1\",\"theValue2\",\"theValue3\")",
    );

    test_translate_filter!(
        in_longs,
        expected = Ok(doc! { "value": { "$in": [1_i64, 2_i64] } }),
        query = "select * from my_table where value IN (1, 2)",
    );
}

mod logic {
    use bson::doc;

    test_translate_filter!(
        simple_and,
        expected = Ok(doc! { "$and": [{ "value": 1_i64 }, { "value2": "theValue" }] }),
        query = "select * from my_table where value=1 AND value2=\"theValue\"",
    );

    test_translate_filter!(
        simple_or,
        expected = Ok(doc! { "$or": [{ "value": 1_i64 }, { "value2": "theValue" }] }),
        query = "select * from my_table where value=1 OR value2=\"theValue\"",
    );

    test_translate_filter!(
        ors_flatten_to_one_list,
        expected = Ok(doc! { "$or": [
            { "value": 1_i64 },
            { "value": 2_i64 },
            { "value": 3_i64 },
        ] }),
        query = "select * from my_table where value=1 OR value=2 OR value=3",
    );

    test_translate_filter!(
        parenthesized_or_chain_flattens,
        expected = Ok(doc! { "$or": [
            { "value": "1234" },
            { "value": "1235" },
            { "value": "1236" },
            { "value": "1237" },
            { "value": "1238" },
        ] }),
        query = "select * from my_table where (value = \"1234\" OR value = \"1235\" OR value = \"1236\" OR value = \"1237\" OR value = \"1238\")",
    );

    test_translate_filter!(
        ands_flatten_to_one_list,
        expected = Ok(doc! { "$and": [
            { "value": "1234" },
            { "value": "1235" },
            { "value": "1236" },
        ] }),
        query = "select * from my_table where (value = \"1234\" AND value = \"1235\" AND value = \"1236\")",
    );

    test_translate_filter!(
        mixed_kinds_stay_grouped,
        expected = Ok(doc! { "$or": [
            { "$and": [{ "a": 1_i64 }, { "b": 2_i64 }] },
            { "c": 3_i64 },
        ] }),
        query = "select * from my_table where a = 1 AND b = 2 OR c = 3",
    );

    test_translate_filter!(
        not_parens,
        expected = Ok(doc! { "$nor": [{ "value": "theValue" }] }),
        query = "select * from my_table where NOT (value=\"theValue\")",
    );

    test_translate_filter!(
        not_parens_around_and,
        expected = Ok(doc! { "$nor": [
            { "$and": [{ "value": 1_i64 }, { "value2": "theValue" }] },
        ] }),
        query = "select * from my_table where NOT (value=1 AND value2=\"theValue\")",
    );

    test_translate_filter!(
        not_parens_around_or,
        expected = Ok(doc! { "$nor": [
            { "$or": [{ "value": 1_i64 }, { "value2": "theValue" }] },
        ] }),
        query = "select * from my_table where NOT (value=1 OR value2=\"theValue\")",
    );

    test_translate_filter!(
        nested_parens_keep_structure,
        expected = Ok(doc! { "$or": [
            { "value": 1_i64 },
            { "$and": [{ "number": 1_i64 }, { "value2": "theValue" }] },
        ] }),
        query = "select * from my_table where value=1 OR (number = 1 AND value2=\"theValue\")",
    );

    test_translate_filter!(
        complicated_nesting,
        expected = Ok(doc! { "$or": [
            { "$and": [
                { "value": 1_i64 },
                { "column": { "$lte": bson::DateTime::from_millis(1481500800000) } },
                { "nullField": { "$exists": false } },
            ] },
            { "$and": [
                { "$or": [
                    { "number": { "$gt": 5_i64 } },
                    { "number": 1_i64 },
                ] },
                { "value2": "theValue" },
            ] },
        ] }),
        query = "select * from my_table where (value=1 and date(column,'YYYY-MM-DD') <= '2016-12-12' AND nullField IS NULL ) OR ((number > 5 OR number = 1) AND value2=\"theValue\")",
    );
}

mod specialty_functions {
    use bson::doc;

    test_translate_filter!(
        bare_function_with_one_argument,
        expected = Ok(doc! { "$and": [
            { "$QUICKSEARCH": "123" },
            { "foo": "bar" },
        ] }),
        query = "select * from my_table where QUICKSEARCH('123') AND (foo = 'bar')",
        options = TranslateOptions::default().with_default_field_type(FieldType::String),
    );

    test_translate_filter!(
        nested_function_calls_recurse,
        expected = Ok(doc! { "$and": [
            { "$toLower": { "$toUpper": "123" } },
            { "foo": "bar" },
        ] }),
        query = "select * from my_table where toLower(toUpper('123')) AND (foo = 'bar')",
        options = TranslateOptions::default().with_default_field_type(FieldType::String),
    );

    test_translate_filter!(
        function_equals_value_becomes_expr,
        expected = Ok(doc! { "$and": [
            { "$expr": { "$eq": [{ "$someFunction": "123" }, "1234"] } },
            { "foo": "bar" },
        ] }),
        query = "select * from my_table where someFunction('123') = \"1234\" AND (foo = 'bar')",
        options = TranslateOptions::default().with_default_field_type(FieldType::String),
    );

    test_translate_filter!(
        function_in_list,
        expected = Ok(doc! { "$and": [
            { "$fin": { "function": { "$someFunction": "field" }, "list": ["1234"] } },
            { "foo": "bar" },
        ] }),
        query = "select * from my_table where someFunction('field') IN (\"1234\") AND (foo = 'bar')",
        options = TranslateOptions::default().with_default_field_type(FieldType::String),
    );

    test_translate_filter!(
        function_not_in_list,
        expected = Ok(doc! { "$and": [
            { "$fnin": { "function": { "$someFunction": "field" }, "list": ["1234"] } },
            { "foo": "bar" },
        ] }),
        query = "select * from my_table where someFunction('field') NOT IN (\"1234\") AND (foo = 'bar')",
        options = TranslateOptions::default().with_default_field_type(FieldType::String),
    );

    test_translate_filter!(
        function_without_arguments,
        expected = Ok(doc! { "$and": [
            { "$QUICKSEARCH": bson::Bson::Null },
            { "foo": "bar" },
        ] }),
        query = "select * from my_table where QUICKSEARCH() AND (foo = 'bar')",
        options = TranslateOptions::default().with_default_field_type(FieldType::String),
    );

    test_translate_filter!(
        function_with_multiple_arguments,
        expected = Ok(doc! { "$and": [
            { "$QUICKSEARCH": [bson::Bson::Int64(123), bson::Bson::String("123".to_string())] },
            { "foo": "bar" },
        ] }),
        query = "select * from my_table where QUICKSEARCH(123, \"123\") AND (foo = 'bar')",
        options = TranslateOptions::default().with_default_field_type(FieldType::String),
    );
}

mod regex_match {
    use crate::translator::Error;
    use bson::doc;

    test_translate_filter!(
        with_equals_true,
        expected = Ok(doc! { "column": { "$regex": "^[ae\"gaf]+$" } }),
        query = "select * from my_table where regexMatch(column,'^[ae\"gaf]+$') = true ",
    );

    test_translate_filter!(
        escaped_quote_in_pattern,
        expected = Ok(doc! { "column": { "$regex": "^[ae\"don'tgaf]+$" } }),
        query = "select * from my_table where regexMatch(column,'^[ae\"don''tgaf]+$') = true ",
    );

    test_translate_filter!(
        ignores_field_type_mapping,
        expected = Ok(doc! { "column": { "$regex": "^[ae\"gaf]+$" } }),
        query = "select * from my_table where regexMatch(column,'^[ae\"gaf]+$') = true ",
        options = TranslateOptions::default()
            .with_field_type("column", FieldType::Date)
            .with_default_field_type(FieldType::String),
    );

    test_translate_filter!(
        with_options,
        expected = Ok(doc! { "column": { "$regex": "^[ae\"gaf]+$", "$options": "si" } }),
        query = "select * from my_table where regexMatch(column,'^[ae\"gaf]+$','si') = true ",
    );

    test_translate_filter!(
        bare_call,
        expected = Ok(doc! { "column": { "$regex": "^[ae\"gaf]+$" } }),
        query = "select * from my_table where regexMatch(column,'^[ae\"gaf]+$')",
    );

    test_translate_filter!(
        equals_false_is_rejected,
        expected = Err(Error::RegexMatchFalse),
        query = "select * from my_table where regexMatch(column,'^[ae\"gaf]+$') = false ",
    );

    #[test]
    fn invalid_pattern_fails_lowering() {
        use crate::{options::TranslateOptions, parser, translator::Translator};
        let statement =
            parser::parse_statement("select * from my_table where regexMatch(column,'[') = true ")
                .expect("query should parse");
        let options = TranslateOptions::default();
        let result = Translator::new(&options).translate(&statement);
        assert!(matches!(result, Err(Error::Regex(_))));
    }
}

mod object_id {
    use bson::doc;
    use bson::oid::ObjectId;
    use std::str::FromStr;

    test_translate_filter!(
        equals,
        expected = Ok(doc! { "$and": [
            { "_id": ObjectId::from_str("53102b43bf1044ed8b0ba36b").unwrap() },
            { "foo": "bar" },
        ] }),
        query = "select * from my_table where OBJECTID('_id') = '53102b43bf1044ed8b0ba36b' AND (foo = 'bar')",
        options = TranslateOptions::default().with_default_field_type(FieldType::String),
    );

    test_translate_filter!(
        not_equals,
        expected = Ok(doc! { "$and": [
            { "_id": { "$ne": ObjectId::from_str("53102b43bf1044ed8b0ba36b").unwrap() } },
            { "foo": "bar" },
        ] }),
        query = "select * from my_table where OBJECTID('_id') != '53102b43bf1044ed8b0ba36b' AND (foo = 'bar')",
        options = TranslateOptions::default().with_default_field_type(FieldType::String),
    );

    test_translate_filter!(
        in_list,
        expected = Ok(doc! { "$and": [
            { "_id": { "$in": [
                ObjectId::from_str("53102b43bf1044ed8b0ba36b").unwrap(),
                ObjectId::from_str("54651022bffebc03098b4568").unwrap(),
            ] } },
            { "foo": "bar" },
        ] }),
        query = "select * from my_table where OBJECTID('_id') IN ('53102b43bf1044ed8b0ba36b', '54651022bffebc03098b4568') AND (foo = 'bar')",
        options = TranslateOptions::default().with_default_field_type(FieldType::String),
    );

    test_translate_filter!(
        not_in_list,
        expected = Ok(doc! { "$and": [
            { "_id": { "$nin": [
                ObjectId::from_str("53102b43bf1044ed8b0ba36b").unwrap(),
                ObjectId::from_str("54651022bffebc03098b4568").unwrap(),
            ] } },
            { "foo": "bar" },
        ] }),
        query = "select * from my_table where OBJECTID('_id') NOT IN ('53102b43bf1044ed8b0ba36b', '54651022bffebc03098b4568') AND (foo = 'bar')",
        options = TranslateOptions::default().with_default_field_type(FieldType::String),
    );
}

mod dates {
    use bson::doc;

    test_translate_filter!(
        date_function_gte,
        expected = Ok(
            doc! { "column": { "$gte": bson::DateTime::from_millis(1481500800000) } }
        ),
        query = "select * from my_table where date(column,'YYYY-MM-DD') >= '2016-12-12' ",
    );

    test_translate_filter!(
        date_function_gt,
        expected = Ok(doc! { "column": { "$gt": bson::DateTime::from_millis(1481500800000) } }),
        query = "select * from my_table where date(column,'YYYY-MM-DD') > '2016-12-12' ",
    );

    test_translate_filter!(
        date_function_lt,
        expected = Ok(doc! { "column": { "$lt": bson::DateTime::from_millis(1481500800000) } }),
        query = "select * from my_table where date(column,'YYYY-MM-DD') < '2016-12-12' ",
    );

    test_translate_filter!(
        date_function_lte,
        expected = Ok(
            doc! { "column": { "$lte": bson::DateTime::from_millis(1481500800000) } }
        ),
        query = "select * from my_table where date(column,'YYYY-MM-DD') <= '2016-12-12' ",
    );

    test_translate_filter!(
        date_function_ignores_field_type_mapping,
        expected = Ok(doc! { "column": { "$gt": bson::DateTime::from_millis(1481500800000) } }),
        query = "select * from my_table where date(column,'YYYY-MM-DD') > '2016-12-12' ",
        options = TranslateOptions::default()
            .with_field_type("column", FieldType::Date)
            .with_default_field_type(FieldType::String),
    );

    test_translate_filter!(
        date_literal_on_right_side,
        expected = Ok(
            doc! { "timeStamp": { "$gte": bson::DateTime::from_millis(1577836800000) } }
        ),
        query = "select * from my_table where timeStamp >= date('2020-01-01')",
    );

    test_translate_filter!(
        natural_format_unparseable,
        expected = Err(crate::translator::Error::BadNaturalDate(
            "not a real date".to_string()
        )),
        query = "select * from my_table where date(column,'natural') <= 'not a real date'",
    );
}

mod bindata {
    use bson::doc;
    use bson::spec::BinarySubtype;
    use bson::{Binary, Bson};

    test_translate_filter!(
        equals_binary,
        expected = Ok(doc! { "MerchantId": { "$eq": Bson::Binary(Binary {
            subtype: BinarySubtype::UuidOld,
            bytes: vec![
                0x16, 0xdd, 0x8f, 0xf4, 0xdb, 0x92, 0x88, 0x41, 0x85, 0x4d, 0x1e, 0xcd,
                0x9b, 0x62, 0xd0, 0x66,
            ],
        }) } }),
        query = "select * from my_table where MerchantId = Bindata('Ft2P9NuSiEGFTR7Nm2LQZg==')",
    );

    test_translate_filter!(
        invalid_base64_is_rejected,
        expected = Err(crate::translator::Error::InvalidBinary(
            "not base64!!".to_string()
        )),
        query = "select * from my_table where MerchantId = Bindata('not base64!!')",
    );
}
