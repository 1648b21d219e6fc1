pub mod mock_listing_server;
