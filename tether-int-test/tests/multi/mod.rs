mod multi_document_test;
